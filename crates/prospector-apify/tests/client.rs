//! Integration tests for `ApifyClient` using wiremock HTTP mocks.

use std::time::Duration;

use prospector_apify::{ApifyClient, ApifyError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ApifyClient {
    ApifyClient::with_base_url("test-token", 5, base_url)
        .expect("client construction should not fail")
        .with_retry(2, 0)
        .with_poll_interval(Duration::ZERO)
}

fn run_body(status: &str) -> serde_json::Value {
    json!({ "data": { "id": "run-1", "status": status, "defaultDatasetId": "ds-1" } })
}

async fn mount_start(server: &MockServer, actor_path: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/acts/{actor_path}/runs")))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_body("READY")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn run_actor_starts_waits_and_fetches_items() {
    let server = MockServer::start().await;
    let input = json!({ "queries": "rust", "resultsPerPage": 10 });

    Mock::given(method("POST"))
        .and(path("/acts/apify~google-search-scraper/runs"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(&input))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_body("READY")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .and(query_param("waitForFinish", "60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("SUCCEEDED")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .and(query_param("format", "json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "title": "a" }, { "title": "b" }])),
        )
        .mount(&server)
        .await;

    let run = test_client(&server.uri())
        .run_actor("apify/google-search-scraper", &input)
        .await
        .expect("run should succeed");

    assert_eq!(run.run.id, "run-1");
    assert_eq!(run.items.len(), 2);
    assert_eq!(run.items[1]["title"], "b");
}

#[tokio::test]
async fn wait_for_run_polls_until_terminal_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("RUNNING")))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("SUCCEEDED")))
        .with_priority(2)
        .mount(&server)
        .await;

    let run = test_client(&server.uri())
        .wait_for_run("run-1")
        .await
        .expect("run should eventually succeed");
    assert!(run.is_succeeded());
}

#[tokio::test]
async fn failed_run_is_reported_with_status() {
    let server = MockServer::start().await;
    mount_start(&server, "me~flaky").await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("FAILED")))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .run_actor("me~flaky", &json!({}))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ApifyError::RunFailed { ref status, .. } if status == "FAILED"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acts/me~x/runs"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "type": "token-not-valid", "message": "Authentication token is not valid" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .start_run("me~x", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApifyError::Unauthenticated { status: 401 }), "got: {err:?}");
    assert!(err.to_string().contains("unauthenticated"));
}

#[tokio::test]
async fn server_errors_are_retried_then_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "ok": true }])))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let items = test_client(&server.uri())
        .get_dataset_items("ds-1")
        .await
        .expect("third attempt should succeed");
    assert_eq!(items, vec![json!({ "ok": true })]);
}

#[tokio::test]
async fn not_found_surfaces_platform_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acts/me~missing/runs"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "type": "record-not-found", "message": "Actor was not found" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .start_run("me~missing", &json!({}))
        .await
        .unwrap_err();
    match err {
        ApifyError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Actor was not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn run_timeout_bounds_the_whole_job() {
    let server = MockServer::start().await;
    mount_start(&server, "me~slow").await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_body("RUNNING"))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .with_run_timeout(Duration::from_millis(300))
        .run_actor("me~slow", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApifyError::Timeout { .. }), "got: {err:?}");
}

#[tokio::test]
async fn long_poll_outlasts_the_client_request_timeout() {
    let server = MockServer::start().await;
    mount_start(&server, "me~patient").await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .and(query_param("waitForFinish", "60"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_body("RUNNING"))
                .set_delay(Duration::from_millis(1_500)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("SUCCEEDED")))
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "n": 1 }])))
        .mount(&server)
        .await;

    let client = ApifyClient::with_base_url("test-token", 1, &server.uri())
        .expect("client construction should not fail")
        .with_retry(0, 0)
        .with_poll_interval(Duration::ZERO);
    let run = client
        .run_actor("me~patient", &json!({}))
        .await
        .expect("a poll held open past the client timeout should still succeed");
    assert_eq!(run.items.len(), 1);
}

#[tokio::test]
async fn start_run_is_not_resent_after_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acts/me~billing/runs"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .start_run("me~billing", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApifyError::Api { status: 503, .. }), "got: {err:?}");
}

#[tokio::test]
async fn start_run_is_resent_when_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/acts/me~busy/runs"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/acts/me~busy/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_body("READY")))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let run = test_client(&server.uri())
        .start_run("me~busy", &json!({}))
        .await
        .expect("second attempt should start the run");
    assert_eq!(run.id, "run-1");
}

#[tokio::test]
async fn timed_out_run_is_aborted() {
    let server = MockServer::start().await;
    mount_start(&server, "me~stuck").await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_body("RUNNING"))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/actor-runs/run-1/abort"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("ABORTING")))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .with_run_timeout(Duration::from_millis(300))
        .run_actor("me~stuck", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApifyError::Timeout { .. }), "got: {err:?}");
}
