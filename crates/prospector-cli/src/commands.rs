//! Command handlers. Every command prints its JSON result to stdout.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use prospector_apify::{ActorPlatformBackend, ApifyOptions};
use prospector_browser::{BrowserBackend, ScrapeKind, SessionManager};
use prospector_core::{AppConfig, BackendKind, PlacesQuery, Prospect};
use serde::Serialize;
use serde_json::Value;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Finds prospect `id` in the JSON array at `path`.
pub(crate) fn load_prospect(path: &Path, id: &str) -> anyhow::Result<Prospect> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read prospects file {}", path.display()))?;
    find_prospect(&raw, id).with_context(|| format!("in {}", path.display()))
}

fn find_prospect(raw: &str, id: &str) -> anyhow::Result<Prospect> {
    let prospects: Vec<Prospect> =
        serde_json::from_str(raw).context("prospects file is not a JSON array of prospects")?;
    prospects
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| anyhow::anyhow!("prospect '{id}' not found"))
}

/// A throwaway prospect built from command-line flags.
pub(crate) fn adhoc_prospect(
    name: Option<String>,
    company: Option<String>,
    profile_url: Option<String>,
    website: Option<String>,
) -> Prospect {
    Prospect {
        id: "cli".to_string(),
        name: name.unwrap_or_default(),
        company,
        linkedin_url: profile_url,
        website,
        extra: serde_json::Map::new(),
    }
}

fn actor_platform(config: &AppConfig) -> ActorPlatformBackend {
    ActorPlatformBackend::new(ApifyOptions::from(config))
}

pub(crate) async fn run_research(
    config: &AppConfig,
    backend: BackendKind,
    prospect: &Prospect,
) -> anyhow::Result<()> {
    let outcome = match backend {
        BackendKind::Browser => {
            let sessions = Arc::new(SessionManager::new(config.browser.clone()));
            let browser = BrowserBackend::new(Arc::clone(&sessions));
            let outcome = prospector_research::research(prospect, &browser).await;
            sessions.close().await;
            outcome?
        }
        BackendKind::ActorPlatform => {
            prospector_research::research(prospect, &actor_platform(config)).await?
        }
    };
    print_json(&outcome)
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    kind: ScrapeKind,
    target: &str,
) -> anyhow::Result<()> {
    let sessions = Arc::new(SessionManager::new(config.browser.clone()));
    let result = BrowserBackend::new(Arc::clone(&sessions))
        .scrape(kind, target)
        .await;
    sessions.close().await;
    print_json(&result)
}

pub(crate) async fn run_places(config: &AppConfig, query: &PlacesQuery) -> anyhow::Result<()> {
    let result = actor_platform(config).search_places(query).await;
    print_json(&result)
}

pub(crate) async fn run_actor(config: &AppConfig, actor_id: &str, input: &str) -> anyhow::Result<()> {
    let input = parse_input(input)?;
    let result = actor_platform(config).run_actor(actor_id, &input).await;
    print_json(&result)
}

fn parse_input(raw: &str) -> anyhow::Result<Value> {
    let input: Value = serde_json::from_str(raw).context("--input is not valid JSON")?;
    anyhow::ensure!(input.is_object(), "--input must be a JSON object");
    Ok(input)
}

pub(crate) async fn run_status(config: &AppConfig) -> anyhow::Result<()> {
    let backend = actor_platform(config);
    print_json(&serde_json::json!({
        "configured": backend.is_configured().await,
        "actors": backend.catalog(),
    }))
}
