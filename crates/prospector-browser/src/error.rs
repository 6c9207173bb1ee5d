use thiserror::Error;

/// Errors raised while driving the headless browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The Chromium process could not be configured or started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// A DevTools protocol command failed.
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("navigation to {url} timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    /// The URL or query could not be used as a lookup target.
    #[error("invalid lookup target '{0}'")]
    InvalidTarget(String),

    /// Anything else the page reported (context creation, target params).
    #[error("page error: {0}")]
    Page(String),
}
