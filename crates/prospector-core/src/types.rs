//! Research domain types: prospects, lookup envelopes, and aggregates.
//!
//! Everything here is serialized with camelCase keys because the same JSON
//! is stored on the prospect record and rendered by the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A CRM prospect as seen by the research engine.
///
/// Only the identifying fields are typed; every other CRM field is kept in
/// `extra` so a load/save round-trip never drops data the engine does not
/// own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, alias = "profileUrl")]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl Prospect {
    /// Profile-network URL, if present and non-blank.
    #[must_use]
    pub fn profile_url(&self) -> Option<&str> {
        non_blank(self.linkedin_url.as_ref())
    }

    /// Website URL, if present and non-blank.
    #[must_use]
    pub fn website_url(&self) -> Option<&str> {
        non_blank(self.website.as_ref())
    }

    /// Free-text web search query built from name and company.
    ///
    /// Returns `None` when both are blank.
    #[must_use]
    pub fn search_query(&self) -> Option<String> {
        let parts: Vec<&str> = [Some(&self.name), self.company.as_ref()]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// The `{ id, name }` pair stamped on every aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProspectRef {
    pub id: String,
    pub name: String,
}

impl From<&Prospect> for ProspectRef {
    fn from(prospect: &Prospect) -> Self {
        Self {
            id: prospect.id.clone(),
            name: prospect.name.clone(),
        }
    }
}

/// Which research strategy produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BackendKind {
    #[serde(rename = "playwright")]
    Browser,
    #[serde(rename = "apify")]
    ActorPlatform,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Browser => "playwright",
            BackendKind::ActorPlatform => "apify",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "playwright" | "browser" => Ok(BackendKind::Browser),
            "apify" | "actor-platform" => Ok(BackendKind::ActorPlatform),
            other => Err(format!("unknown research backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LookupKind {
    Profile,
    Website,
    Contacts,
    Search,
    Places,
}

impl LookupKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LookupKind::Profile => "profile",
            LookupKind::Website => "website",
            LookupKind::Contacts => "contacts",
            LookupKind::Search => "search",
            LookupKind::Places => "places",
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope returned by every individual lookup.
///
/// Build it through [`LookupResult::ok`] or [`LookupResult::failed`]: a failed
/// result always carries a non-empty `error` and `data = null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub source: BackendKind,
    pub actor_or_method_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LookupResult {
    pub fn ok(source: BackendKind, actor_or_method_id: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            source,
            actor_or_method_id: actor_or_method_id.into(),
            run_id: None,
            note: None,
        }
    }

    pub fn failed(
        source: BackendKind,
        actor_or_method_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "lookup failed without an error message".to_string()
        } else {
            error
        };
        Self {
            success: false,
            data: None,
            error: Some(error),
            source,
            actor_or_method_id: actor_or_method_id.into(),
            run_id: None,
            note: None,
        }
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Combined result of one research call against one backend.
///
/// A `None` slot means the lookup was not applicable to the prospect; an
/// attempted-and-failed lookup is `Some` with `success = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchAggregate {
    pub prospect: ProspectRef,
    pub profile: Option<LookupResult>,
    pub website: Option<LookupResult>,
    pub contacts: Option<LookupResult>,
    pub search_results: Option<LookupResult>,
    pub researched_at: DateTime<Utc>,
    pub source: BackendKind,
}

impl ResearchAggregate {
    #[must_use]
    pub fn empty(prospect: ProspectRef, source: BackendKind, researched_at: DateTime<Utc>) -> Self {
        Self {
            prospect,
            profile: None,
            website: None,
            contacts: None,
            search_results: None,
            researched_at,
            source,
        }
    }

    #[must_use]
    pub fn slot(&self, kind: LookupKind) -> Option<&LookupResult> {
        match kind {
            LookupKind::Profile => self.profile.as_ref(),
            LookupKind::Website => self.website.as_ref(),
            LookupKind::Contacts => self.contacts.as_ref(),
            LookupKind::Search => self.search_results.as_ref(),
            LookupKind::Places => None,
        }
    }

    /// Places a lookup result into its slot. `Places` has no slot and is ignored.
    pub fn set_slot(&mut self, kind: LookupKind, result: LookupResult) {
        match kind {
            LookupKind::Profile => self.profile = Some(result),
            LookupKind::Website => self.website = Some(result),
            LookupKind::Contacts => self.contacts = Some(result),
            LookupKind::Search => self.search_results = Some(result),
            LookupKind::Places => {}
        }
    }

    /// Attempted lookups in slot order.
    pub fn attempted(&self) -> impl Iterator<Item = (LookupKind, &LookupResult)> {
        [
            LookupKind::Profile,
            LookupKind::Website,
            LookupKind::Contacts,
            LookupKind::Search,
        ]
        .into_iter()
        .filter_map(|kind| self.slot(kind).map(|r| (kind, r)))
    }

    /// Summary of attempted vs. failed lookups, or `None` if nothing failed.
    #[must_use]
    pub fn partial_data(&self) -> Option<PartialData> {
        let mut attempted = 0;
        let mut failed = Vec::new();
        for (kind, result) in self.attempted() {
            attempted += 1;
            if !result.success {
                failed.push(kind);
            }
        }
        if failed.is_empty() {
            return None;
        }
        Some(PartialData {
            attempted,
            succeeded: attempted - failed.len(),
            failed,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartialData {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<LookupKind>,
}

/// Top-level outcome of a research call.
///
/// `success` reflects the orchestration only; per-lookup outcomes live in
/// the aggregate slots and are summarized in `partial_data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOutcome {
    pub success: bool,
    pub data: ResearchAggregate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_data: Option<PartialData>,
}

impl From<ResearchAggregate> for ResearchOutcome {
    fn from(data: ResearchAggregate) -> Self {
        let partial_data = data.partial_data();
        Self {
            success: true,
            data,
            partial_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prospect() -> Prospect {
        Prospect {
            id: "p-1".to_string(),
            name: "Ada Lovelace".to_string(),
            company: Some("Analytical Engines".to_string()),
            linkedin_url: Some("   ".to_string()),
            website: Some("https://engines.example".to_string()),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn blank_profile_url_is_treated_as_absent() {
        assert_eq!(prospect().profile_url(), None);
        assert_eq!(prospect().website_url(), Some("https://engines.example"));
    }

    #[test]
    fn search_query_joins_name_and_company() {
        assert_eq!(
            prospect().search_query().as_deref(),
            Some("Ada Lovelace Analytical Engines")
        );
        let anonymous = Prospect {
            id: "p-2".to_string(),
            ..Prospect::default()
        };
        assert_eq!(anonymous.search_query(), None);
    }

    #[test]
    fn failed_result_never_carries_data_or_empty_error() {
        let result = LookupResult::failed(BackendKind::Browser, "website", "  ");
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    }

    #[test]
    fn lookup_result_serializes_camel_case_with_null_data() {
        let result = LookupResult::failed(BackendKind::ActorPlatform, "apify~x", "boom");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["actorOrMethodId"], "apify~x");
        assert_eq!(value["source"], "apify");
        assert!(value["data"].is_null());
        assert!(value.get("runId").is_none());
    }

    #[test]
    fn prospect_round_trip_keeps_unknown_crm_fields() {
        let raw = json!({
            "id": "p-9",
            "name": "Grace",
            "linkedinUrl": "https://www.linkedin.com/in/grace",
            "status": "contacted",
            "tags": ["navy"]
        });
        let parsed: Prospect = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.profile_url(), Some("https://www.linkedin.com/in/grace"));
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["status"], "contacted");
        assert_eq!(back["tags"], json!(["navy"]));
    }

    #[test]
    fn partial_data_absent_when_all_attempted_succeed() {
        let mut aggregate =
            ResearchAggregate::empty(ProspectRef::from(&prospect()), BackendKind::Browser, Utc::now());
        aggregate.set_slot(
            LookupKind::Website,
            LookupResult::ok(BackendKind::Browser, "website", json!({})),
        );
        assert!(aggregate.partial_data().is_none());
    }

    #[test]
    fn outcome_is_successful_even_when_every_lookup_failed() {
        let mut aggregate =
            ResearchAggregate::empty(ProspectRef::from(&prospect()), BackendKind::Browser, Utc::now());
        aggregate.set_slot(
            LookupKind::Website,
            LookupResult::failed(BackendKind::Browser, "website", "timeout"),
        );
        aggregate.set_slot(
            LookupKind::Search,
            LookupResult::failed(BackendKind::Browser, "search", "timeout"),
        );
        let outcome = ResearchOutcome::from(aggregate);
        assert!(outcome.success);
        let partial = outcome.partial_data.expect("partial data");
        assert_eq!(partial.attempted, 2);
        assert_eq!(partial.succeeded, 0);
        assert_eq!(partial.failed, vec![LookupKind::Website, LookupKind::Search]);
    }
}
