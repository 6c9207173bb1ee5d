//! The capability set every research backend provides.

use async_trait::async_trait;

use crate::types::{BackendKind, LookupKind, LookupResult};

/// A research strategy able to run the four per-prospect lookups.
///
/// Implementations never return errors: transient failures, timeouts, and
/// missing configuration all come back as a failed [`LookupResult`]. The
/// `data` of a successful result is already in canonical shape
/// (`ProfileRecord`, `WebsiteRecord`, `ContactRecord`, or a list of
/// `SearchResultRecord`).
#[async_trait]
pub trait ResearchBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn lookup_profile(&self, profile_url: &str) -> LookupResult;

    async fn lookup_website(&self, website_url: &str) -> LookupResult;

    async fn lookup_contacts(&self, website_url: &str) -> LookupResult;

    async fn lookup_search(&self, query: &str) -> LookupResult;

    /// Dispatches by kind. `Places` is not a per-prospect lookup and yields
    /// a failed result.
    async fn lookup(&self, kind: LookupKind, target: &str) -> LookupResult {
        match kind {
            LookupKind::Profile => self.lookup_profile(target).await,
            LookupKind::Website => self.lookup_website(target).await,
            LookupKind::Contacts => self.lookup_contacts(target).await,
            LookupKind::Search => self.lookup_search(target).await,
            LookupKind::Places => LookupResult::failed(
                self.kind(),
                kind.as_str(),
                "places search is not a per-prospect lookup",
            ),
        }
    }
}
