use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.google.com/search";
pub const DEFAULT_APIFY_BASE_URL: &str = "https://api.apify.com/v2";

/// Launch and navigation settings for the headless browser backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Disables the Chromium sandbox (needed in some containers).
    pub no_sandbox: bool,
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout_secs: u64,
    /// Pause after navigation so client-side rendering can settle.
    pub settle_delay_ms: u64,
    pub search_base_url: String,
    pub search_results: usize,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: false,
            chrome_path: None,
            navigation_timeout_secs: 30,
            settle_delay_ms: 1_500,
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            search_results: 10,
        }
    }
}

/// Actor identifiers used for each lookup on the actor platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorIds {
    pub profile: String,
    pub website: String,
    pub contacts: String,
    pub search: String,
    pub places: String,
}

impl Default for ActorIds {
    fn default() -> Self {
        Self {
            profile: "dev_fusion~linkedin-profile-scraper".to_string(),
            website: "apify~website-content-crawler".to_string(),
            contacts: "vdrmota~contact-info-scraper".to_string(),
            search: "apify~google-search-scraper".to_string(),
            places: "compass~crawler-google-places".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub settings_path: PathBuf,
    pub prospects_path: PathBuf,
    pub browser: BrowserSettings,
    pub apify_base_url: String,
    pub apify_request_timeout_secs: u64,
    pub apify_run_timeout_secs: u64,
    pub apify_max_retries: u32,
    pub apify_backoff_base_ms: u64,
    pub actors: ActorIds,
    pub rate_limit_per_minute: usize,
}
