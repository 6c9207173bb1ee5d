//! Lookup applicability.

use prospector_core::{LookupKind, Prospect};

/// One lookup the orchestrator will run, with the target it runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLookup {
    pub kind: LookupKind,
    pub target: String,
}

impl PlannedLookup {
    fn new(kind: LookupKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }
}

/// Lookups that apply to `prospect`, in slot order.
///
/// A profile URL enables the profile lookup, a website enables website and
/// contacts, and a name or company enables the web search. Blank fields
/// count as absent.
#[must_use]
pub fn plan(prospect: &Prospect) -> Vec<PlannedLookup> {
    let mut lookups = Vec::with_capacity(4);
    if let Some(url) = prospect.profile_url() {
        lookups.push(PlannedLookup::new(LookupKind::Profile, url));
    }
    if let Some(website) = prospect.website_url() {
        lookups.push(PlannedLookup::new(LookupKind::Website, website));
        lookups.push(PlannedLookup::new(LookupKind::Contacts, website));
    }
    if let Some(query) = prospect.search_query() {
        lookups.push(PlannedLookup::new(LookupKind::Search, query));
    }
    lookups
}
