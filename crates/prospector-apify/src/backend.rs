//! Research backend that delegates every lookup to a remote actor run.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use prospector_core::normalize::{
    normalize_contacts, normalize_place, normalize_profile, normalize_search_results,
    normalize_website,
};
use prospector_core::{
    filter_places, ActorIds, AppConfig, BackendKind, LookupKind, LookupResult, PlaceRecord,
    PlacesQuery, PlacesSearchResult, ResearchBackend, Settings,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::catalog::{self, ActorInfo};
use crate::client::{ApifyClient, DEFAULT_BASE_URL};
use crate::types::ActorRun;

/// Error reported by every operation when no access token is configured.
pub const NOT_CONFIGURED: &str = "actor platform not configured: add apifyToken to settings";

const SOURCE: BackendKind = BackendKind::ActorPlatform;

/// Connection and actor settings for [`ActorPlatformBackend`].
#[derive(Debug, Clone)]
pub struct ApifyOptions {
    pub settings_path: PathBuf,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub search_results: usize,
    pub actors: ActorIds,
}

impl ApifyOptions {
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 60,
            run_timeout_secs: 300,
            max_retries: 2,
            backoff_base_ms: 500,
            search_results: 10,
            actors: ActorIds::default(),
        }
    }
}

impl From<&AppConfig> for ApifyOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            settings_path: config.settings_path.clone(),
            base_url: config.apify_base_url.clone(),
            request_timeout_secs: config.apify_request_timeout_secs,
            run_timeout_secs: config.apify_run_timeout_secs,
            max_retries: config.apify_max_retries,
            backoff_base_ms: config.apify_backoff_base_ms,
            search_results: config.browser.search_results,
            actors: config.actors.clone(),
        }
    }
}

/// Actor-platform research backend.
///
/// The access token is read from the settings file on first use and the
/// outcome is cached for the lifetime of the backend. Without a token every
/// operation fails fast with [`NOT_CONFIGURED`] and makes no network call.
pub struct ActorPlatformBackend {
    options: ApifyOptions,
    client: OnceCell<Option<ApifyClient>>,
}

impl ActorPlatformBackend {
    #[must_use]
    pub fn new(options: ApifyOptions) -> Self {
        Self {
            options,
            client: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Vec<ActorInfo> {
        catalog::catalog(&self.options.actors)
    }

    pub async fn is_configured(&self) -> bool {
        self.client().await.is_some()
    }

    async fn client(&self) -> Option<&ApifyClient> {
        self.client
            .get_or_init(|| async { self.build_client() })
            .await
            .as_ref()
    }

    fn build_client(&self) -> Option<ApifyClient> {
        let settings = match Settings::load(&self.options.settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "could not read settings; actor platform disabled");
                return None;
            }
        };
        let Some(token) = settings.apify_token() else {
            tracing::info!(
                path = %self.options.settings_path.display(),
                "no actor platform token configured"
            );
            return None;
        };
        match ApifyClient::with_base_url(
            token,
            self.options.request_timeout_secs,
            &self.options.base_url,
        ) {
            Ok(client) => Some(
                client
                    .with_retry(self.options.max_retries, self.options.backoff_base_ms)
                    .with_run_timeout(Duration::from_secs(self.options.run_timeout_secs)),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "failed to build actor platform client");
                None
            }
        }
    }

    /// Runs `actor_id` to completion, or returns the failed result to report.
    async fn execute(
        &self,
        lookup: &str,
        actor_id: &str,
        input: &Value,
    ) -> Result<ActorRun, LookupResult> {
        let Some(client) = self.client().await else {
            return Err(LookupResult::failed(SOURCE, actor_id, NOT_CONFIGURED));
        };
        client.run_actor(actor_id, input).await.map_err(|e| {
            tracing::warn!(lookup, actor_id, error = %e, "actor lookup failed");
            LookupResult::failed(SOURCE, actor_id, e.to_string())
        })
    }

    /// Runs the places actor, normalizes every item, and applies the
    /// caller's filters. `total_results` counts the filtered records.
    pub async fn search_places(&self, query: &PlacesQuery) -> PlacesSearchResult {
        let actor_id = self.options.actors.places.as_str();
        if query.query.trim().is_empty() {
            return PlacesSearchResult::failed(actor_id, "query must not be empty");
        }
        let run = match self
            .execute(LookupKind::Places.as_str(), actor_id, &catalog::places_input(query))
            .await
        {
            Ok(run) => run,
            Err(failed) => {
                return PlacesSearchResult::failed(
                    actor_id,
                    failed.error.unwrap_or_else(|| NOT_CONFIGURED.to_string()),
                )
            }
        };

        let scraped_at = Utc::now();
        let mut places: Vec<PlaceRecord> = Vec::with_capacity(run.items.len());
        for item in &run.items {
            match normalize_place(item, SOURCE.as_str(), scraped_at) {
                Ok(place) => places.push(place),
                Err(e) => tracing::warn!(actor_id, error = %e, "skipping malformed place item"),
            }
        }
        let data = filter_places(&places, &query.filter());
        tracing::info!(
            actor_id,
            run_id = %run.run.id,
            fetched = places.len(),
            kept = data.len(),
            "places search finished"
        );

        PlacesSearchResult {
            success: true,
            total_results: data.len(),
            data,
            source: SOURCE.as_str().to_string(),
            actor_id: actor_id.to_string(),
            run_id: Some(run.run.id),
            error: None,
        }
    }

    /// Runs any actor with caller-supplied input and returns its raw items.
    pub async fn run_actor(&self, actor_id: &str, input: &Value) -> LookupResult {
        if actor_id.trim().is_empty() {
            return LookupResult::failed(SOURCE, actor_id, "actorId must not be empty");
        }
        match self.execute("actor", actor_id, input).await {
            Ok(run) => LookupResult::ok(SOURCE, actor_id, Value::Array(run.items))
                .with_run_id(run.run.id),
            Err(failed) => failed,
        }
    }

    /// Runs the actor for `lookup` and shapes the items with `shape`.
    async fn lookup_with<F>(&self, lookup: LookupKind, input: Value, shape: F) -> LookupResult
    where
        F: FnOnce(&[Value]) -> Result<Value, String> + Send,
    {
        let actor_id = self.actor_for(lookup).to_string();
        let run = match self.execute(lookup.as_str(), &actor_id, &input).await {
            Ok(run) => run,
            Err(failed) => return failed,
        };
        match shape(&run.items) {
            Ok(data) => LookupResult::ok(SOURCE, &actor_id, data).with_run_id(run.run.id),
            Err(e) => {
                tracing::warn!(
                    lookup = %lookup,
                    actor_id = %actor_id,
                    error = %e,
                    "could not normalize actor output"
                );
                LookupResult::failed(SOURCE, &actor_id, e).with_run_id(run.run.id)
            }
        }
    }

    fn actor_for(&self, lookup: LookupKind) -> &str {
        let actors = &self.options.actors;
        match lookup {
            LookupKind::Profile => &actors.profile,
            LookupKind::Website => &actors.website,
            LookupKind::Contacts => &actors.contacts,
            LookupKind::Search => &actors.search,
            LookupKind::Places => &actors.places,
        }
    }
}

fn to_data<T: Serialize>(record: &T) -> Result<Value, String> {
    serde_json::to_value(record).map_err(|e| e.to_string())
}

fn first_item(items: &[Value]) -> Result<&Value, String> {
    items
        .first()
        .ok_or_else(|| "actor run returned no items".to_string())
}

#[async_trait]
impl ResearchBackend for ActorPlatformBackend {
    fn kind(&self) -> BackendKind {
        SOURCE
    }

    async fn lookup_profile(&self, profile_url: &str) -> LookupResult {
        let url = profile_url.to_string();
        self.lookup_with(
            LookupKind::Profile,
            catalog::profile_input(profile_url),
            move |items| {
                let mut record = normalize_profile(first_item(items)?).map_err(|e| e.to_string())?;
                record.profile_url.get_or_insert(url);
                to_data(&record)
            },
        )
        .await
    }

    async fn lookup_website(&self, website_url: &str) -> LookupResult {
        let url = website_url.to_string();
        self.lookup_with(
            LookupKind::Website,
            catalog::website_input(website_url),
            move |items| {
                let mut record = normalize_website(first_item(items)?).map_err(|e| e.to_string())?;
                if record.url.is_empty() {
                    record.url = url;
                }
                to_data(&record)
            },
        )
        .await
    }

    async fn lookup_contacts(&self, website_url: &str) -> LookupResult {
        self.lookup_with(
            LookupKind::Contacts,
            catalog::contacts_input(website_url),
            |items| to_data(&normalize_contacts(items).map_err(|e| e.to_string())?),
        )
        .await
    }

    async fn lookup_search(&self, query: &str) -> LookupResult {
        let limit = self.options.search_results;
        self.lookup_with(
            LookupKind::Search,
            catalog::search_input(query, limit),
            move |items| {
                let mut results = normalize_search_results(items).map_err(|e| e.to_string())?;
                results.truncate(limit);
                to_data(&results)
            },
        )
        .await
    }
}
