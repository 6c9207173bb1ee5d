use super::*;
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use prospector_apify::{ApifyOptions, NOT_CONFIGURED};
use prospector_core::{BackendKind, BrowserSettings, LookupKind, LookupResult, Prospect};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::middleware::RateLimitState;

/// Browser stand-in: succeeds for everything except the search lookup.
#[derive(Default)]
struct FakeBrowser {
    calls: Mutex<Vec<(LookupKind, String)>>,
}

impl FakeBrowser {
    fn answer(&self, kind: LookupKind, target: &str) -> LookupResult {
        self.calls.lock().unwrap().push((kind, target.to_string()));
        if kind == LookupKind::Search {
            LookupResult::failed(BackendKind::Browser, "browser.web-search", "navigation timed out")
        } else {
            LookupResult::ok(BackendKind::Browser, kind.as_str(), json!({ "url": target }))
        }
    }
}

#[async_trait]
impl ResearchBackend for FakeBrowser {
    fn kind(&self) -> BackendKind {
        BackendKind::Browser
    }

    async fn lookup_profile(&self, profile_url: &str) -> LookupResult {
        self.answer(LookupKind::Profile, profile_url)
    }

    async fn lookup_website(&self, website_url: &str) -> LookupResult {
        self.answer(LookupKind::Website, website_url)
    }

    async fn lookup_contacts(&self, website_url: &str) -> LookupResult {
        self.answer(LookupKind::Contacts, website_url)
    }

    async fn lookup_search(&self, query: &str) -> LookupResult {
        self.answer(LookupKind::Search, query)
    }
}

struct Harness {
    app: Router,
    browser: Arc<FakeBrowser>,
    _settings: tempfile::NamedTempFile,
}

fn ada() -> Prospect {
    Prospect {
        id: "p-1".to_string(),
        name: "Ada Lovelace".to_string(),
        company: Some("Analytical Engines".to_string()),
        linkedin_url: None,
        website: Some("https://engines.example".to_string()),
        ..Prospect::default()
    }
}

fn settings_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write settings");
    file
}

/// `platform` of `None` leaves the actor platform unconfigured.
fn harness(platform: Option<&MockServer>, rate_limit: RateLimitState) -> Harness {
    let settings = match platform {
        Some(_) => settings_file(r#"{ "apifyToken": "test-token" }"#),
        None => settings_file("{}"),
    };
    let mut options = ApifyOptions::new(settings.path());
    if let Some(server) = platform {
        options.base_url = server.uri();
    }
    options.max_retries = 0;
    options.run_timeout_secs = 10;

    let browser = Arc::new(FakeBrowser::default());
    let state = AppState {
        store: Arc::new(ProspectStore::in_memory(vec![ada()])),
        browser: Arc::clone(&browser) as Arc<dyn ResearchBackend>,
        sessions: Arc::new(SessionManager::new(BrowserSettings::default())),
        apify: Arc::new(ActorPlatformBackend::new(options)),
    };
    Harness {
        app: build_app(state, rate_limit),
        browser,
        _settings: settings,
    }
}

fn unlimited() -> RateLimitState {
    RateLimitState::per_minute(1_000)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-request-id", "req-test")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_reports_idle_browser_and_unconfigured_platform() {
    let h = harness(None, unlimited());
    let (status, json) = send(&h.app, get_req("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["browser"], "idle");
    assert_eq!(json["data"]["apify"], "not_configured");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn browser_research_is_returned_and_stored() {
    let h = harness(None, unlimited());
    let (status, json) = send(
        &h.app,
        post_json("/api/prospects/p-1/research/playwright", &json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["source"], "playwright");
    assert_eq!(json["data"]["prospect"]["id"], "p-1");
    assert!(json["data"]["profile"].is_null());
    assert_eq!(json["data"]["website"]["success"], true);
    assert_eq!(json["data"]["searchResults"]["success"], false);
    assert_eq!(json["partialData"]["failed"], json!(["search"]));
    assert_eq!(json["meta"]["request_id"], "req-test");
    assert_eq!(h.browser.calls.lock().unwrap().len(), 3);

    let (status, stored) = send(&h.app, get_req("/api/prospects/p-1/research")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["data"]["playwright"], json["data"]);
    assert!(stored["data"]["apify"].is_null());
}

#[tokio::test]
async fn unconfigured_platform_research_is_successful_with_failed_slots() {
    let h = harness(None, unlimited());
    let (status, json) = send(
        &h.app,
        post_json("/api/prospects/p-1/research/apify", &json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["source"], "apify");
    assert_eq!(json["data"]["website"]["error"], NOT_CONFIGURED);
    assert_eq!(json["partialData"]["succeeded"], 0);
    assert_eq!(json["partialData"]["attempted"], 3);
}

#[tokio::test]
async fn unknown_prospect_and_backend_are_rejected() {
    let h = harness(None, unlimited());
    let (status, json) = send(
        &h.app,
        post_json("/api/prospects/ghost/research/playwright", &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["meta"]["request_id"], "req-test");

    let (status, json) = send(
        &h.app,
        post_json("/api/prospects/p-1/research/selenium", &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _) = send(&h.app, get_req("/api/prospects/ghost/research")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(h.browser.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scrape_dispatches_by_type() {
    let h = harness(None, unlimited());
    let (status, json) = send(
        &h.app,
        post_json(
            "/api/research/scrape",
            &json!({ "url": "https://engines.example", "type": "website" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["source"], "playwright");
    assert_eq!(
        h.browser.calls.lock().unwrap().as_slice(),
        &[(LookupKind::Website, "https://engines.example".to_string())]
    );

    let (status, json) = send(
        &h.app,
        post_json(
            "/api/research/scrape",
            &json!({ "url": "https://engines.example", "type": "pdf" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("unknown scrape type"));
}

#[tokio::test]
async fn status_lists_catalog_and_configuration() {
    let h = harness(None, unlimited());
    let (status, json) = send(&h.app, get_req("/api/search/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["configured"], false);
    let actors = json["data"]["actors"].as_array().unwrap();
    assert_eq!(actors.len(), 5);
    assert_eq!(actors[4]["lookup"], "places");
    assert_eq!(actors[4]["actorId"], "compass~crawler-google-places");
}

#[tokio::test]
async fn places_search_normalizes_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acts/compass~crawler-google-places/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-1", "status": "RUNNING", "defaultDatasetId": "ds-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "run-1", "status": "SUCCEEDED", "defaultDatasetId": "ds-1" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "title": "Bakery One", "website": "https://one.example", "reviewsCount": 3 },
            { "title": "Bakery Two", "website": "", "reviewsCount": 1 },
            { "name": "Bakery Three", "website": "https://three.example", "reviewsCount": 80 }
        ])))
        .mount(&server)
        .await;

    let h = harness(Some(&server), unlimited());
    let (status, json) = send(
        &h.app,
        post_json(
            "/api/search/google-maps",
            &json!({
                "query": "bakery",
                "location": "Austin, TX",
                "maxResults": 10,
                "hasWebsite": true,
                "maxReviews": 10
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["totalResults"], 1);
    assert_eq!(json["data"][0]["name"], "Bakery One");
    assert_eq!(json["runId"], "run-1");
    assert_eq!(json["actorId"], "compass~crawler-google-places");
}

#[tokio::test]
async fn places_search_requires_a_query() {
    let h = harness(None, unlimited());
    let (status, json) = send(
        &h.app,
        post_json("/api/search/google-maps", &json!({ "query": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn actor_passthrough_reports_not_configured() {
    let h = harness(None, unlimited());
    let (status, json) = send(
        &h.app,
        post_json(
            "/api/apify/run",
            &json!({ "actorId": "someone~custom-actor", "input": { "a": 1 } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], NOT_CONFIGURED);
    assert!(json["data"].is_null());

    let (status, _) = send(
        &h.app,
        post_json(
            "/api/apify/run",
            &json!({ "actorId": "someone~custom-actor", "input": [1, 2] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn research_routes_are_rate_limited() {
    let h = harness(None, RateLimitState::per_minute(1));
    let (first, _) = send(
        &h.app,
        post_json("/api/prospects/p-1/research/playwright", &json!({})),
    )
    .await;
    assert_eq!(first, StatusCode::OK);

    let (second, json) = send(
        &h.app,
        post_json("/api/prospects/p-1/research/playwright", &json!({})),
    )
    .await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");

    // Reads are not throttled.
    let (status, _) = send(&h.app, get_req("/api/prospects/p-1/research")).await;
    assert_eq!(status, StatusCode::OK);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("not_found", StatusCode::NOT_FOUND),
        ("validation_error", StatusCode::BAD_REQUEST),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        assert_eq!(ApiError::new("r", code, "m").into_response().status(), expected);
    }
}
