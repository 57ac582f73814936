//! Input validation for the lookup entrypoint: missing/blank parameters and
//! unknown carriers answer 400/404 without mutating the store.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;
use trk_daemon::{routes, state::AppState};
use trk_schemas::{CapabilityPayloads, DeliveryStatus, TrackingSnapshot};
use trk_testkit::{offline_carrier, MemoryCarrierDirectory, MemoryTrackingStore, StubFetcher};

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

fn make_router_with_store() -> (axum::Router, Arc<MemoryTrackingStore>) {
    let directory =
        MemoryCarrierDirectory::new(vec![offline_carrier("CJ대한통운", "cjlogistics")]);
    let store = Arc::new(MemoryTrackingStore::new());
    let st = Arc::new(AppState::new(
        Arc::new(directory),
        Arc::clone(&store) as Arc<dyn trk_db::TrackingStore>,
        Arc::new(StubFetcher::new(dummy_snapshot())),
    ));
    (routes::build_router(st), store)
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).expect("json body"))
}

#[tokio::test]
async fn missing_both_parameters_is_400() {
    let (router, store) = make_router_with_store();
    let (status, json) = get(router, "/v1/tracking").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("carrier"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn missing_tracking_number_is_400() {
    let (router, store) = make_router_with_store();
    let (status, json) = get(router, "/v1/tracking?carrier=cjlogistics").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("tracking_number"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn blank_parameter_counts_as_missing() {
    let (router, store) = make_router_with_store();
    let (status, json) =
        get(router, "/v1/tracking?carrier=%20%20&tracking_number=123").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(store.is_empty());
}

#[tokio::test]
async fn unknown_carrier_is_404_and_store_untouched() {
    let (router, store) = make_router_with_store();
    let (status, json) =
        get(router, "/v1/tracking?carrier=nosuch&tracking_number=123").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("nosuch"));
    assert!(store.is_empty());
}
