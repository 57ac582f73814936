//! Axum router and all HTTP handlers for trk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are thin shims over the service layer so the
//! scenario tests in `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use crate::{
    api_types::{
        failure, success, CarrierSummary, HealthResponse, LookupParams, LookupResponse,
        RegisterRequest,
    },
    service::{self, ServiceError},
    state::AppState,
};

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/carriers", get(list_carriers))
        .route("/v1/tracking", get(lookup_tracking).post(register_tracking))
        .with_state(state)
}

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> Response {
    success(
        StatusCode::OK,
        HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        },
    )
}

/// GET /v1/carriers — directory sorted by name, credentials omitted.
pub(crate) async fn list_carriers(State(st): State<Arc<AppState>>) -> Response {
    match st.directory.list_all().await {
        Ok(carriers) => {
            let summaries: Vec<CarrierSummary> =
                carriers.into_iter().map(CarrierSummary::from).collect();
            success(StatusCode::OK, summaries)
        }
        Err(err) => failure(&ServiceError::Persistence(err.to_string())),
    }
}

/// GET /v1/tracking?carrier=&tracking_number= — lookup/upsert.
pub(crate) async fn lookup_tracking(
    State(st): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Response {
    let carrier = params.carrier.unwrap_or_default();
    let tracking_number = params.tracking_number.unwrap_or_default();

    match service::lookup(&st, &carrier, &tracking_number).await {
        Ok(outcome) => success(
            StatusCode::OK,
            LookupResponse {
                record: outcome.record,
                api_data: outcome.api_data,
            },
        ),
        Err(err) => failure(&err),
    }
}

/// POST /v1/tracking — create-only registration, 201 on success.
pub(crate) async fn register_tracking(
    State(st): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let carrier_code = body.carrier_code.unwrap_or_default();
    let tracking_number = body.tracking_number.unwrap_or_default();

    match service::register(&st, &carrier_code, &tracking_number).await {
        Ok(record) => success(StatusCode::CREATED, record),
        Err(err) => failure(&err),
    }
}
