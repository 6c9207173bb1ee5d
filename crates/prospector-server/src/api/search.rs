//! Ad-hoc lookups, places search, and actor-platform passthrough.

use axum::{extract::State, Extension, Json};
use prospector_apify::ActorInfo;
use prospector_browser::ScrapeKind;
use prospector_core::{LookupResult, PlacesQuery, PlacesSearchResult, ResearchBackend};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeRequest {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RunActorRequest {
    pub actor_id: String,
    #[serde(default)]
    pub input: Option<Value>,
}

/// A lookup envelope with the response meta alongside.
#[derive(Debug, Serialize)]
pub(super) struct LookupResponse {
    #[serde(flatten)]
    pub result: LookupResult,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub(super) struct PlacesResponse {
    #[serde(flatten)]
    pub result: PlacesSearchResult,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub(super) struct StatusData {
    pub configured: bool,
    pub actors: Vec<ActorInfo>,
}

fn require_non_blank<'a>(req_id: &str, field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("'{field}' must not be empty"),
        ));
    }
    Ok(trimmed)
}

/// POST /api/research/scrape: one browser lookup outside a research call.
pub(super) async fn scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScrapeRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let rid = &req_id.0;
    let kind: ScrapeKind = body
        .kind
        .parse()
        .map_err(|e: String| ApiError::new(rid, "validation_error", e))?;
    let target = require_non_blank(rid, "url", &body.url)?;

    let result = state.browser.lookup(kind.lookup_kind(), target).await;
    Ok(Json(LookupResponse {
        result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/search/google-maps: bulk places search with local filters.
pub(super) async fn search_places(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(query): Json<PlacesQuery>,
) -> Result<Json<PlacesResponse>, ApiError> {
    require_non_blank(&req_id.0, "query", &query.query)?;
    let result = state.apify.search_places(&query).await;
    Ok(Json(PlacesResponse {
        result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/search/status
pub(super) async fn status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<StatusData>> {
    Json(ApiResponse {
        data: StatusData {
            configured: state.apify.is_configured().await,
            actors: state.apify.catalog(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

/// POST /api/apify/run: generic actor invocation.
pub(super) async fn run_actor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RunActorRequest>,
) -> Result<Json<LookupResponse>, ApiError> {
    let actor_id = require_non_blank(&req_id.0, "actorId", &body.actor_id)?;
    let input = body.input.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    if !input.is_object() {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "'input' must be a JSON object",
        ));
    }

    let result = state.apify.run_actor(actor_id, &input).await;
    Ok(Json(LookupResponse {
        result,
        meta: ResponseMeta::new(req_id.0),
    }))
}
