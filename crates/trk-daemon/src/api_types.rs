//! Request and response types for all trk-daemon HTTP endpoints.
//!
//! Every body is wrapped in the `{"success": …}` envelope. No business logic
//! lives here beyond the `ServiceError` → HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use trk_schemas::{CapabilityPayloads, Carrier, TrackingRecord};
use uuid::Uuid;

use crate::service::ServiceError;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /v1/carriers
// ---------------------------------------------------------------------------

/// Public view of a carrier. The capability endpoint URLs embed the upstream
/// credential as a query parameter, so they are omitted along with the key
/// itself; only the public deep link survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierSummary {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub tracking_url: String,
}

impl From<Carrier> for CarrierSummary {
    fn from(carrier: Carrier) -> Self {
        Self {
            id: carrier.id,
            name: carrier.name,
            code: carrier.code,
            tracking_url: carrier.tracking_url,
        }
    }
}

// ---------------------------------------------------------------------------
// /v1/tracking
// ---------------------------------------------------------------------------

/// Query parameters for the lookup entrypoint. Optional here; blank-vs-absent
/// is settled by the service layer so both answer 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Body of `POST /v1/tracking`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub carrier_code: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Lookup payload: the reconciled record plus raw upstream capability
/// payloads for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub record: TrackingRecord,
    pub api_data: CapabilityPayloads,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// `{"success": true, "data": …}` with the given status.
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}

/// `{"success": false, "error": …}` with the status the error maps to.
pub fn failure(err: &ServiceError) -> Response {
    let status = match err {
        ServiceError::MissingParameter(_) => StatusCode::BAD_REQUEST,
        ServiceError::UnknownCarrier(_) => StatusCode::NOT_FOUND,
        ServiceError::DuplicateTrackingNumber => StatusCode::CONFLICT,
        ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}
