use prospector_core::LookupKind;
use thiserror::Error;

/// Failures of the orchestration itself. Lookup failures never end up here.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("invalid prospect: {0}")]
    InvalidProspect(String),

    #[error("lookup '{0}' was planned more than once")]
    DuplicateLookup(LookupKind),
}
