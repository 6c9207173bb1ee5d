use thiserror::Error;

/// Errors returned by the actor-platform API client.
#[derive(Debug, Error)]
pub enum ApifyError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform rejected the access token (401/403).
    #[error("unauthenticated: actor platform rejected the access token (status {status})")]
    Unauthenticated { status: u16 },

    /// Non-2xx response other than an auth failure.
    #[error("actor platform API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The run finished in a terminal non-success state.
    #[error("actor run {run_id} finished with status {status}")]
    RunFailed { run_id: String, status: String },

    /// The whole run (start, wait, fetch) exceeded the configured bound.
    #[error("actor run did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
