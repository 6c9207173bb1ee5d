//! Domain types, configuration, and normalization shared by every
//! prospector crate.

pub mod app_config;
pub mod backend;
pub mod config;
pub mod normalize;
pub mod patterns;
pub mod places;
pub mod records;
pub mod settings;
pub mod types;

use thiserror::Error;

pub use app_config::{ActorIds, AppConfig, BrowserSettings, Environment};
pub use backend::ResearchBackend;
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::NormalizeError;
pub use places::{filter_places, PlacesFilter, PlacesQuery, PlacesSearchResult};
pub use records::{
    ContactRecord, PlaceRecord, ProfileRecord, SearchResultRecord, SocialLinks, WebsiteRecord,
};
pub use settings::{Settings, SettingsError};
pub use types::{
    BackendKind, LookupKind, LookupResult, PartialData, Prospect, ProspectRef, ResearchAggregate,
    ResearchOutcome,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
