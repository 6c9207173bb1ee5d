//! Browser automation backend: profile, website, contacts, and web search
//! lookups driven through isolated page contexts.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prospector_core::{BackendKind, LookupKind, LookupResult, ResearchBackend};
use reqwest::Url;
use serde_json::Value;

use crate::error::BrowserError;
use crate::extract;
use crate::session::{PageContext, SessionManager};

const SOURCE: BackendKind = BackendKind::Browser;

const PROFILE_METHOD: &str = "browser.profile-page";
const WEBSITE_METHOD: &str = "browser.website-page";
const CONTACTS_METHOD: &str = "browser.contact-pages";
const SEARCH_METHOD: &str = "browser.web-search";

/// Target type accepted by the ad-hoc scrape endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeKind {
    Linkedin,
    Website,
    Search,
}

impl ScrapeKind {
    #[must_use]
    pub fn lookup_kind(self) -> LookupKind {
        match self {
            Self::Linkedin => LookupKind::Profile,
            Self::Website => LookupKind::Website,
            Self::Search => LookupKind::Search,
        }
    }
}

impl FromStr for ScrapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" | "profile" => Ok(Self::Linkedin),
            "website" => Ok(Self::Website),
            "search" => Ok(Self::Search),
            other => Err(format!(
                "unknown scrape type '{other}' (expected linkedin, website, or search)"
            )),
        }
    }
}

struct LoadedPage {
    html: String,
    final_url: String,
}

pub struct BrowserBackend {
    sessions: Arc<SessionManager>,
}

impl BrowserBackend {
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Runs a single lookup outside of a research call.
    pub async fn scrape(&self, kind: ScrapeKind, target: &str) -> LookupResult {
        self.lookup(kind.lookup_kind(), target).await
    }

    /// Navigates with a bounded wait, lets the page settle, and snapshots it.
    async fn load(&self, context: &PageContext, url: &str) -> Result<LoadedPage, BrowserError> {
        let settings = self.sessions.settings();
        let secs = settings.navigation_timeout_secs;
        let page = context.page();

        tokio::time::timeout(Duration::from_secs(secs), page.goto(url))
            .await
            .map_err(|_| BrowserError::NavigationTimeout {
                url: url.to_string(),
                secs,
            })??;
        tokio::time::sleep(Duration::from_millis(settings.settle_delay_ms)).await;

        let html = page.content().await?;
        let final_url = page.url().await?.unwrap_or_else(|| url.to_string());
        tracing::debug!(url, final_url = %final_url, bytes = html.len(), "page loaded");
        Ok(LoadedPage { html, final_url })
    }

    /// Opens a context, loads `url`, and always closes the context.
    async fn load_isolated(&self, url: &str) -> Result<LoadedPage, BrowserError> {
        let context = self.sessions.new_isolated_context().await?;
        let loaded = self.load(&context, url).await;
        context.close().await;
        loaded
    }

    async fn profile(&self, url: &str) -> Result<(Value, Option<String>), BrowserError> {
        let url = checked_url(url)?;
        let page = self.load_isolated(&url).await?;
        let record = extract_blocking(move || {
            extract::extract_profile(&page.html, &url, &page.final_url)
        })
        .await?;
        let note = record.note.clone();
        Ok((to_data(&record)?, note))
    }

    async fn website(&self, url: &str) -> Result<Value, BrowserError> {
        let url = checked_url(url)?;
        let page = self.load_isolated(&url).await?;
        let record =
            extract_blocking(move || extract::extract_website(&page.html, &page.final_url)).await?;
        to_data(&record)
    }

    /// Home page plus the first contact-looking page, in one context.
    async fn contacts(&self, url: &str) -> Result<Value, BrowserError> {
        let url = checked_url(url)?;
        let context = self.sessions.new_isolated_context().await?;

        let home = match self.load(&context, &url).await {
            Ok(home) => home,
            Err(e) => {
                context.close().await;
                return Err(e);
            }
        };
        let (mut record, contact_url) = match extract_blocking(move || {
            (
                extract::extract_contacts(&home.html, &home.final_url),
                extract::find_contact_link(&home.html, &home.final_url),
            )
        })
        .await
        {
            Ok(found) => found,
            Err(e) => {
                context.close().await;
                return Err(e);
            }
        };

        if let Some(contact_url) = contact_url {
            match self.load(&context, &contact_url).await {
                Ok(page) => {
                    let extracted = extract_blocking(move || {
                        extract::extract_contacts(&page.html, &page.final_url)
                    })
                    .await;
                    match extracted {
                        Ok(found) => record.merge(&found),
                        Err(e) => {
                            tracing::debug!(url = %contact_url, error = %e, "contact page not extracted");
                        }
                    }
                }
                Err(e) => tracing::debug!(url = %contact_url, error = %e, "contact page not loaded"),
            }
        }
        context.close().await;
        to_data(&record)
    }

    async fn search(&self, query: &str) -> Result<Value, BrowserError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(BrowserError::InvalidTarget("empty search query".to_string()));
        }
        let settings = self.sessions.settings();
        let limit = settings.search_results;
        let url = extract::search_url(&settings.search_base_url, query, limit);
        let page = self.load_isolated(&url).await?;
        let results = extract_blocking(move || {
            extract::extract_search_results(&page.html, &page.final_url, limit)
        })
        .await?;
        to_data(&results)
    }
}

/// Runs HTML extraction on the blocking pool.
async fn extract_blocking<T, F>(f: F) -> Result<T, BrowserError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BrowserError::Page(format!("extraction task failed: {e}")))
}

/// Accepts only absolute http(s) URLs; a bare domain gets `https://`.
fn checked_url(raw: &str) -> Result<String, BrowserError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(url.to_string())
        }
        _ => Err(BrowserError::InvalidTarget(raw.to_string())),
    }
}

fn to_data<T: serde::Serialize>(record: &T) -> Result<Value, BrowserError> {
    serde_json::to_value(record).map_err(|e| BrowserError::Page(e.to_string()))
}

fn into_result(method: &str, target: &str, outcome: Result<Value, BrowserError>) -> LookupResult {
    match outcome {
        Ok(data) => LookupResult::ok(SOURCE, method, data),
        Err(e) => {
            tracing::warn!(lookup = method, url = target, error = %e, "browser lookup failed");
            LookupResult::failed(SOURCE, method, e.to_string())
        }
    }
}

#[async_trait]
impl ResearchBackend for BrowserBackend {
    fn kind(&self) -> BackendKind {
        SOURCE
    }

    async fn lookup_profile(&self, profile_url: &str) -> LookupResult {
        match self.profile(profile_url).await {
            Ok((data, Some(note))) => LookupResult::ok(SOURCE, PROFILE_METHOD, data).with_note(note),
            Ok((data, None)) => LookupResult::ok(SOURCE, PROFILE_METHOD, data),
            Err(e) => into_result(PROFILE_METHOD, profile_url, Err(e)),
        }
    }

    async fn lookup_website(&self, website_url: &str) -> LookupResult {
        into_result(WEBSITE_METHOD, website_url, self.website(website_url).await)
    }

    async fn lookup_contacts(&self, website_url: &str) -> LookupResult {
        into_result(CONTACTS_METHOD, website_url, self.contacts(website_url).await)
    }

    async fn lookup_search(&self, query: &str) -> LookupResult {
        into_result(SEARCH_METHOD, query, self.search(query).await)
    }
}
