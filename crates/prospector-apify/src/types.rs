//! Wire types for the actor-platform REST API.

use serde::Deserialize;
use serde_json::Value;

/// Every platform response wraps its payload in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// Run metadata returned by the start and poll endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub default_dataset_id: String,
}

impl RunData {
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }

    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self.status.as_str(),
            "FAILED" | "ABORTED" | "TIMED-OUT" | "TIMED_OUT"
        )
    }
}

/// A finished run together with its dataset items.
#[derive(Debug, Clone)]
pub struct ActorRun {
    pub run: RunData,
    pub items: Vec<Value>,
}

/// Error body shape: `{ "error": { "type": "...", "message": "..." } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}
