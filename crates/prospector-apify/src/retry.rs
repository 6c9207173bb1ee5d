//! Exponential back-off with jitter for actor-platform requests.

use std::future::Future;
use std::time::Duration;

use crate::error::ApifyError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Network timeouts, connection failures, 429 and 5xx responses are
/// transient. Auth failures, 4xx responses, failed runs, and malformed bodies
/// are returned immediately.
pub(crate) fn is_retriable(err: &ApifyError) -> bool {
    match err {
        ApifyError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ApifyError::Api { status, .. } => *status == 429 || *status >= 500,
        ApifyError::Unauthenticated { .. }
        | ApifyError::RunFailed { .. }
        | ApifyError::Timeout { .. }
        | ApifyError::Deserialize { .. }
        | ApifyError::InvalidBaseUrl(_) => false,
    }
}

/// Narrower policy for requests that create something on the platform.
///
/// Only failures where the request cannot have been acted on qualify: the
/// connection was never made, or the platform rate-limited it. A timeout or
/// 5xx may mean the run was started anyway.
pub(crate) fn is_safe_to_resend(err: &ApifyError) -> bool {
    match err {
        ApifyError::Http(e) => e.is_connect(),
        ApifyError::Api { status, .. } => *status == 429,
        _ => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The delay before retry `n` is `backoff_base_ms × 2ⁿ⁻¹` with ±25 % jitter,
/// capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    operation: F,
) -> Result<T, ApifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApifyError>>,
{
    retry_when(max_retries, backoff_base_ms, is_retriable, operation).await
}

/// [`retry_with_backoff`] with a caller-chosen retry predicate.
pub(crate) async fn retry_when<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    should_retry: fn(&ApifyError) -> bool,
    mut operation: F,
) -> Result<T, ApifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApifyError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !should_retry(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "actor platform transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
