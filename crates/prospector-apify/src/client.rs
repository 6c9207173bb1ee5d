//! HTTP client for the actor-platform REST API.
//!
//! A run goes through three calls: start the actor, long-poll the run until
//! it reaches a terminal status, then read the run's default dataset. Each
//! read is retried on transient failures, while starting a run is resent
//! only when the platform cannot have seen it. The whole sequence is bounded
//! by the run timeout, and a run still going when it expires is aborted.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApifyError;
use crate::retry::{is_safe_to_resend, retry_when, retry_with_backoff};
use crate::types::{ActorRun, ApiResponse, ErrorEnvelope, RunData};

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Seconds the platform may hold a poll request open before answering.
const WAIT_FOR_FINISH_SECS: u64 = 60;

/// Extra time a poll request gets on top of the server-side hold.
const POLL_MARGIN_SECS: u64 = 15;

/// Client for the actor-platform REST API.
///
/// Use [`ApifyClient::new`] for production or [`ApifyClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
    run_timeout: Duration,
    poll_interval: Duration,
}

impl ApifyClient {
    /// Creates a client pointed at the production platform.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, ApifyError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ApifyError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ApifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("prospector/0.1 (prospect-research)")
            .build()?;

        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| ApifyError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url: trimmed.to_owned(),
            max_retries: 2,
            backoff_base_ms: 500,
            run_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// Pause between polls when the platform answers before the run is done.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Starts a run of `actor_id` with `input`. Returns immediately with the
    /// run metadata. A timeout or 5xx is not resent, since the run may
    /// already exist.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError`] on network failure, auth rejection, a non-2xx
    /// status, or a malformed body.
    pub async fn start_run(&self, actor_id: &str, input: &Value) -> Result<RunData, ApifyError> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_path(actor_id));
        let url = url.as_str();
        let envelope: ApiResponse<RunData> = retry_when(
            self.max_retries,
            self.backoff_base_ms,
            is_safe_to_resend,
            || async move {
                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.token)
                    .json(input)
                    .send()
                    .await?;
                read_json(response, url).await
            },
        )
        .await?;
        Ok(envelope.data)
    }

    /// Polls a run until it succeeds.
    ///
    /// Each poll may be held open by the platform for up to
    /// `WAIT_FOR_FINISH_SECS`, so it gets its own request timeout instead of
    /// the client default.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::RunFailed`] if the run ends `FAILED`, `ABORTED`,
    /// or `TIMED-OUT`, and any request error from the poll itself.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData, ApifyError> {
        let url = format!(
            "{}/actor-runs/{run_id}?waitForFinish={WAIT_FOR_FINISH_SECS}",
            self.base_url
        );
        let url = url.as_str();
        loop {
            let envelope: ApiResponse<RunData> =
                retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
                    let response = self
                        .client
                        .get(url)
                        .timeout(Duration::from_secs(WAIT_FOR_FINISH_SECS + POLL_MARGIN_SECS))
                        .bearer_auth(&self.token)
                        .send()
                        .await?;
                    read_json(response, url).await
                })
                .await?;

            let run = envelope.data;
            if run.is_succeeded() {
                return Ok(run);
            }
            if run.is_terminal_failure() {
                return Err(ApifyError::RunFailed {
                    run_id: run.id,
                    status: run.status,
                });
            }
            tracing::debug!(run_id, status = %run.status, "actor run still in progress");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Fetches every item of a dataset as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError`] on request failure or if the body is not a
    /// JSON array.
    pub async fn get_dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>, ApifyError> {
        let url = format!(
            "{}/datasets/{dataset_id}/items?format=json&clean=true",
            self.base_url
        );
        let url = url.as_str();
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.token)
                .send()
                .await?;
            read_json(response, url).await
        })
        .await
    }

    /// Asks the platform to abort a run.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError`] if the request fails or is rejected.
    pub async fn abort_run(&self, run_id: &str) -> Result<RunData, ApifyError> {
        let url = format!("{}/actor-runs/{run_id}/abort", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let envelope: ApiResponse<RunData> = read_json(response, &url).await?;
        Ok(envelope.data)
    }

    /// Runs an actor end to end: start, wait, fetch items.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Timeout`] if the sequence exceeds the run
    /// timeout, otherwise any error from the individual steps. A run that
    /// was started before the timeout is aborted.
    pub async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<ActorRun, ApifyError> {
        let secs = self.run_timeout.as_secs();
        let deadline = tokio::time::Instant::now() + self.run_timeout;

        let started = tokio::time::timeout_at(deadline, self.start_run(actor_id, input))
            .await
            .map_err(|_| ApifyError::Timeout { secs })??;
        tracing::info!(actor_id, run_id = %started.id, "actor run started");

        match tokio::time::timeout_at(deadline, self.finish_run(actor_id, &started.id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(actor_id, run_id = %started.id, secs, "actor run timed out, aborting");
                if let Err(e) = self.abort_run(&started.id).await {
                    tracing::warn!(run_id = %started.id, error = %e, "failed to abort actor run");
                }
                Err(ApifyError::Timeout { secs })
            }
        }
    }

    async fn finish_run(&self, actor_id: &str, run_id: &str) -> Result<ActorRun, ApifyError> {
        let run = self.wait_for_run(run_id).await?;
        tracing::info!(
            actor_id,
            run_id = %run.id,
            dataset_id = %run.default_dataset_id,
            "actor run finished, fetching dataset"
        );

        let items = self.get_dataset_items(&run.default_dataset_id).await?;
        tracing::info!(actor_id, run_id = %run.id, count = items.len(), "fetched dataset items");
        Ok(ActorRun { run, items })
    }
}

/// Actor ids may be written `user/name`; the API path form is `user~name`.
fn actor_path(actor_id: &str) -> String {
    actor_id.trim().replace('/', "~")
}

async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, ApifyError> {
    let status = response.status();
    let body = response.text().await?;
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ApifyError::Unauthenticated {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(ApifyError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|source| ApifyError::Deserialize {
        context: context.to_owned(),
        source,
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_owned()
            } else {
                trimmed.chars().take(200).collect()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_path_uses_tilde_separator() {
        assert_eq!(actor_path("apify/google-search-scraper"), "apify~google-search-scraper");
        assert_eq!(actor_path("compass~crawler-google-places"), "compass~crawler-google-places");
    }

    #[test]
    fn error_message_prefers_platform_message() {
        let body = r#"{"error":{"type":"record-not-found","message":"Actor was not found"}}"#;
        assert_eq!(error_message(body), "Actor was not found");
        assert_eq!(error_message("  "), "empty response body");
        assert_eq!(error_message("gateway down"), "gateway down");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApifyClient::with_base_url("t", 5, "https://api.example.test/v2/").unwrap();
        assert_eq!(client.base_url, "https://api.example.test/v2");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ApifyClient::with_base_url("t", 5, "not a url").unwrap_err();
        assert!(matches!(err, ApifyError::InvalidBaseUrl(_)), "got: {err:?}");
    }
}
