//! Per-prospect research handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use prospector_core::{BackendKind, ResearchBackend, ResearchOutcome};
use prospector_research::ResearchError;
use serde::Serialize;

use crate::middleware::RequestId;
use crate::store::{StoreError, StoredResearch};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ResearchResponse {
    #[serde(flatten)]
    pub outcome: ResearchOutcome,
    pub meta: ResponseMeta,
}

fn parse_backend(req_id: &str, raw: &str) -> Result<BackendKind, ApiError> {
    match raw {
        "playwright" => Ok(BackendKind::Browser),
        "apify" => Ok(BackendKind::ActorPlatform),
        other => Err(ApiError::new(
            req_id,
            "validation_error",
            format!("backend must be 'playwright' or 'apify', got '{other}'"),
        )),
    }
}

fn map_research_error(req_id: &str, error: &ResearchError) -> ApiError {
    match error {
        ResearchError::InvalidProspect(reason) => {
            ApiError::new(req_id, "validation_error", reason.clone())
        }
        ResearchError::DuplicateLookup(_) => {
            tracing::error!(error = %error, "research orchestration failed");
            ApiError::new(req_id, "internal_error", "research orchestration failed")
        }
    }
}

/// POST /api/prospects/{id}/research/{backend}: run research and store it.
pub(super) async fn run_research(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, backend)): Path<(String, String)>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let rid = &req_id.0;
    let kind = parse_backend(rid, &backend)?;
    let prospect = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("prospect '{id}' not found")))?;

    let backend: &dyn ResearchBackend = match kind {
        BackendKind::Browser => state.browser.as_ref(),
        BackendKind::ActorPlatform => state.apify.as_ref(),
    };
    let outcome = prospector_research::research(&prospect, backend)
        .await
        .map_err(|e| map_research_error(rid, &e))?;

    match state.store.save_research(outcome.data.clone()).await {
        Ok(()) => {}
        Err(StoreError::NotFound(_)) => {
            return Err(ApiError::new(
                rid,
                "not_found",
                format!("prospect '{id}' not found"),
            ))
        }
        // The research itself succeeded; keep returning it.
        Err(e) => tracing::error!(prospect_id = %id, error = %e, "failed to persist research"),
    }

    Ok(Json(ResearchResponse {
        outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/prospects/{id}/research: last stored aggregate per backend.
pub(super) async fn get_research(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredResearch>>, ApiError> {
    let data = state.store.research(&id).await.ok_or_else(|| {
        ApiError::new(&req_id.0, "not_found", format!("prospect '{id}' not found"))
    })?;
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
