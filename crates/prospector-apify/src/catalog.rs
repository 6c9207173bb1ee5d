//! Actors used for each lookup and the JSON input each one expects.

use prospector_core::{ActorIds, LookupKind, PlacesQuery};
use serde::Serialize;
use serde_json::{json, Value};

/// Pages the contact actor may crawl beyond the start URL.
const CONTACT_MAX_PAGES: u32 = 5;
const CONTACT_MAX_DEPTH: u32 = 1;

/// One entry of the catalog reported by the status endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActorInfo {
    pub lookup: LookupKind,
    pub actor_id: String,
    pub description: &'static str,
}

#[must_use]
pub fn catalog(actors: &ActorIds) -> Vec<ActorInfo> {
    [
        (LookupKind::Profile, &actors.profile, "Public profile page details"),
        (LookupKind::Website, &actors.website, "Company website content"),
        (LookupKind::Contacts, &actors.contacts, "Emails, phones and social links from a website"),
        (LookupKind::Search, &actors.search, "Organic web search results"),
        (LookupKind::Places, &actors.places, "Bulk business listings from map search"),
    ]
    .into_iter()
    .map(|(lookup, actor_id, description)| ActorInfo {
        lookup,
        actor_id: actor_id.clone(),
        description,
    })
    .collect()
}

pub(crate) fn profile_input(profile_url: &str) -> Value {
    json!({ "profileUrls": [profile_url] })
}

pub(crate) fn website_input(url: &str) -> Value {
    json!({
        "startUrls": [{ "url": url }],
        "maxCrawlPages": 1,
        "maxCrawlDepth": 0,
    })
}

pub(crate) fn contacts_input(url: &str) -> Value {
    json!({
        "startUrls": [{ "url": url }],
        "maxCrawlPages": CONTACT_MAX_PAGES,
        "maxCrawlDepth": CONTACT_MAX_DEPTH,
        "sameDomain": true,
    })
}

pub(crate) fn search_input(query: &str, results_per_page: usize) -> Value {
    json!({
        "queries": query,
        "maxPagesPerQuery": 1,
        "resultsPerPage": results_per_page,
        "languageCode": "en",
        "countryCode": "us",
    })
}

pub(crate) fn places_input(query: &PlacesQuery) -> Value {
    let mut input = json!({
        "searchStringsArray": [query.query],
        "maxCrawledPlacesPerSearch": query.result_cap(),
        "language": "en",
        "scrapeContacts": true,
    });
    if let Some(location) = query.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        input["locationQuery"] = Value::String(location.to_owned());
    }
    input
}
