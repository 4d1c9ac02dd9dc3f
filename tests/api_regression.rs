//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and drive the
//! webhook and history endpoints with `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use alert_history::api::{create_app, create_app_with_limit, ApiState};
use alert_history::storage::{self, Backend, StoreConfig};
use alert_history::{HistoryService, IdGenerator, Message};

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

const FIXTURE: &str = include_str!("testdata/request.json");
const DEFAULT_TEMPLATE: &str = "{groupLabels.alertname}_{receiver}";

fn create_test_app(backend: Backend, template: &str) -> Router {
    let store = storage::open(backend, &StoreConfig::Ephemeral).unwrap();
    let service = HistoryService::new(store, IdGenerator::new(template).unwrap());
    create_app(ApiState::new(service))
}

fn post_webhook(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(resp: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Posting the fixture and reading it back by id, on the given backend.
async fn record_and_read_back(backend: Backend) {
    let app = create_test_app(backend, DEFAULT_TEMPLATE);

    let resp = app.clone().oneshot(post_webhook(FIXTURE)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, serde_json::json!({ "id": "Test_webhook" }));

    let resp = app.oneshot(get("/history/Test_webhook")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let alerts = json_body(resp).await;

    let posted: Message = serde_json::from_str(FIXTURE).unwrap();
    let stored: Vec<alert_history::Alert> = serde_json::from_value(alerts.clone()).unwrap();
    assert_eq!(stored, posted.alerts);

    let alert = &alerts[0];
    assert_eq!(alert["startsAt"], "2018-08-03T09:52:26.739266876+02:00");
    assert_eq!(alert["labels"]["job"], "prometheus24");
    assert_eq!(alert["generatorURL"], "http://example.com");
    assert!(alert.get("fingerprint").is_none(), "empty fingerprint must be omitted");
}

#[tokio::test]
async fn test_webhook_round_trip_sled() {
    record_and_read_back(Backend::Sled).await;
}

#[tokio::test]
async fn test_webhook_round_trip_memory() {
    record_and_read_back(Backend::Memory).await;
}

#[tokio::test]
async fn test_unknown_id_returns_404() {
    let app = create_test_app(Backend::Sled, DEFAULT_TEMPLATE);

    let resp = app.oneshot(get("/history/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = json_body(resp).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_returns_every_entry() {
    let app = create_test_app(Backend::Sled, "{groupLabels.alertname}_{status}");

    let resolved = FIXTURE.replacen("\"status\": \"firing\"", "\"status\": \"resolved\"", 1);
    for body in [FIXTURE.to_string(), resolved] {
        let resp = app.clone().oneshot(post_webhook(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app.oneshot(get("/history")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    let mut ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, ["Test_firing", "Test_resolved"]);
}

#[tokio::test]
async fn test_same_id_overwrites() {
    let app = create_test_app(Backend::Sled, DEFAULT_TEMPLATE);

    let mut second: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
    second["alerts"][0]["status"] = "resolved".into();

    for body in [FIXTURE.to_string(), second.to_string()] {
        let resp = app.clone().oneshot(post_webhook(body)).await.unwrap();
        assert_eq!(json_body(resp).await["id"], "Test_webhook");
    }

    let resp = app.clone().oneshot(get("/history/Test_webhook")).await.unwrap();
    let alerts = json_body(resp).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["status"], "resolved");

    let resp = app.oneshot(get("/history")).await.unwrap();
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let app = create_test_app(Backend::Sled, DEFAULT_TEMPLATE);

    let resp = app.clone().oneshot(post_webhook("{\"receiver\": ")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "BAD_REQUEST");

    // Nothing was stored
    let resp = app.oneshot(get("/history")).await.unwrap();
    assert_eq!(json_body(resp).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_missing_template_key_returns_422() {
    let app = create_test_app(Backend::Sled, "{commonAnnotations.summary}");

    let resp = app.clone().oneshot(post_webhook(FIXTURE)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(resp).await;
    assert_eq!(json["error"]["code"], "UNPROCESSABLE");
    assert!(json["error"]["message"].as_str().unwrap().contains("summary"));

    let resp = app.oneshot(get("/history")).await.unwrap();
    assert_eq!(json_body(resp).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_version_and_status_template() {
    let app = create_test_app(Backend::Memory, "{version}-{status}");

    let resp = app.oneshot(post_webhook(FIXTURE)).await.unwrap();
    assert_eq!(json_body(resp).await["id"], "4-firing");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let store = storage::open(Backend::Memory, &StoreConfig::Ephemeral).unwrap();
    let service = HistoryService::new(store, IdGenerator::new(DEFAULT_TEMPLATE).unwrap());
    let app = create_app_with_limit(ApiState::new(service), 64);

    let resp = app.oneshot(post_webhook(FIXTURE)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_durable_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::Durable {
        path: dir.path().join("history"),
    };

    {
        let store = storage::open(Backend::Sled, &config).unwrap();
        let service = HistoryService::new(store, IdGenerator::new(DEFAULT_TEMPLATE).unwrap());
        let app = create_app(ApiState::new(service.clone()));
        let resp = app.oneshot(post_webhook(FIXTURE)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        service.flush().unwrap();
    }

    let store = storage::open(Backend::Sled, &config).unwrap();
    let service = HistoryService::new(store, IdGenerator::new(DEFAULT_TEMPLATE).unwrap());
    let app = create_app(ApiState::new(service));
    let resp = app.oneshot(get("/history/Test_webhook")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await[0]["labels"]["alertname"], "Test");
}
