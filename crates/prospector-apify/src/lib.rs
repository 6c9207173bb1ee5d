//! Actor-platform client and the research backend built on top of it.

pub mod backend;
pub mod catalog;
pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use backend::{ActorPlatformBackend, ApifyOptions, NOT_CONFIGURED};
pub use catalog::ActorInfo;
pub use client::ApifyClient;
pub use error::ApifyError;
pub use types::{ActorRun, RunData};
