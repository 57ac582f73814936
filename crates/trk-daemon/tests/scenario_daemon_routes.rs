//! In-process scenario tests for the basic trk-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot` — no network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // oneshot
use trk_daemon::{routes, state::AppState};
use trk_schemas::{Carrier, CapabilityPayloads, DeliveryStatus, TrackingSnapshot};
use trk_testkit::{MemoryCarrierDirectory, MemoryTrackingStore, StubFetcher};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn carrier(name: &str, code: &str) -> Carrier {
    Carrier {
        id: Uuid::new_v4(),
        name: name.to_string(),
        code: code.to_string(),
        tracking_url: format!("https://example.com/{code}?nr="),
        tracking_info_url: String::new(),
        delivery_time_url: String::new(),
        location_url: String::new(),
        status_url: String::new(),
        api_key: "super-secret-key".to_string(),
        api_key_url: String::new(),
    }
}

fn dummy_snapshot() -> TrackingSnapshot {
    TrackingSnapshot {
        status: DeliveryStatus::InTransit,
        current_location: "서울 물류센터".to_string(),
        last_updated: Utc::now(),
        history: vec![],
        raw: CapabilityPayloads {
            base_info: json!({}),
            delivery_time: json!({}),
            location: json!({}),
            status: json!({}),
        },
    }
}

/// Router over in-memory doubles; directory deliberately unsorted on input.
fn make_router() -> axum::Router {
    let directory = MemoryCarrierDirectory::new(vec![
        carrier("한진택배", "hanjin"),
        carrier("CJ대한통운", "cjlogistics"),
        carrier("롯데택배", "lotte"),
    ]);
    let st = Arc::new(AppState::new(
        Arc::new(directory),
        Arc::new(MemoryTrackingStore::new()),
        Arc::new(StubFetcher::new(dummy_snapshot())),
    ));
    routes::build_router(st)
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let (status, body) = call(make_router(), get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["ok"], true);
    assert_eq!(json["data"]["service"], "trk-daemon");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = call(make_router(), get("/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// GET /v1/carriers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn carriers_are_sorted_by_name_and_omit_credentials() {
    let (status, body) = call(make_router(), get("/v1/carriers")).await;
    assert_eq!(status, StatusCode::OK);

    // The raw body must not carry the credential anywhere.
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("super-secret-key"));
    assert!(!text.contains("api_key"));

    let json = parse_json(body);
    assert_eq!(json["success"], true);

    let carriers = json["data"].as_array().expect("data is an array");
    assert_eq!(carriers.len(), 3);

    let names: Vec<&str> = carriers
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    // Public fields survive.
    assert!(carriers[0]["id"].is_string());
    assert!(carriers[0]["code"].is_string());
    assert!(carriers[0]["tracking_url"].is_string());
}
