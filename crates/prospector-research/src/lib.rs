//! Research orchestration: decide which lookups apply to a prospect, run
//! them concurrently against one backend, and assemble the aggregate.

pub mod error;
pub mod orchestrator;
pub mod plan;

pub use error::ResearchError;
pub use orchestrator::research;
pub use plan::{plan, PlannedLookup};
