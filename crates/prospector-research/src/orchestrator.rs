//! Concurrent fan-out over the planned lookups.

use chrono::Utc;
use futures::future::join_all;
use prospector_core::{
    LookupKind, LookupResult, Prospect, ProspectRef, ResearchAggregate, ResearchBackend,
    ResearchOutcome,
};
use tracing::Instrument;

use crate::error::ResearchError;
use crate::plan::{plan, PlannedLookup};

/// Research one prospect against one backend.
///
/// Every applicable lookup is started at once and all of them are awaited,
/// whatever their outcome. Lookups that do not apply leave their slot empty.
/// `researchedAt` is stamped when the aggregate is assembled, after the last
/// lookup settled.
///
/// The outcome is successful even when every lookup failed; the failures
/// are summarized in `partialData`.
///
/// # Errors
///
/// Returns [`ResearchError`] only for problems in the orchestration itself,
/// such as a prospect without an id.
pub async fn research(
    prospect: &Prospect,
    backend: &dyn ResearchBackend,
) -> Result<ResearchOutcome, ResearchError> {
    if prospect.id.trim().is_empty() {
        return Err(ResearchError::InvalidProspect(
            "prospect id is blank".to_string(),
        ));
    }
    let source = backend.kind();
    let lookups = plan(prospect);
    tracing::info!(
        prospect_id = %prospect.id,
        backend = %source,
        lookups = lookups.len(),
        "research started"
    );

    let settled = join_all(lookups.into_iter().map(|lookup| run_one(backend, lookup))).await;

    let mut aggregate = ResearchAggregate::empty(ProspectRef::from(prospect), source, Utc::now());
    for (kind, result) in settled {
        if aggregate.slot(kind).is_some() {
            return Err(ResearchError::DuplicateLookup(kind));
        }
        aggregate.set_slot(kind, result);
    }

    let outcome = ResearchOutcome::from(aggregate);
    match &outcome.partial_data {
        Some(partial) => tracing::warn!(
            prospect_id = %prospect.id,
            backend = %source,
            attempted = partial.attempted,
            succeeded = partial.succeeded,
            "research finished with failed lookups"
        ),
        None => tracing::info!(prospect_id = %prospect.id, backend = %source, "research finished"),
    }
    Ok(outcome)
}

async fn run_one(
    backend: &dyn ResearchBackend,
    lookup: PlannedLookup,
) -> (LookupKind, LookupResult) {
    let span = tracing::info_span!("lookup", lookup = %lookup.kind);
    let result = backend
        .lookup(lookup.kind, &lookup.target)
        .instrument(span)
        .await;
    if let Some(error) = &result.error {
        tracing::debug!(lookup = %lookup.kind, error = %error, "lookup settled with failure");
    }
    (lookup.kind, result)
}
