//! trk-carrier
//!
//! External Tracking Client: given a carrier and a tracking number, produce a
//! normalized [`TrackingSnapshot`] — from the carrier's four capability
//! endpoints when all of them answer, or from the deterministic synthetic
//! generator when any of them fails.
//!
//! Fetch policy (preserve exactly, see DESIGN.md):
//! - four independent calls: base info, delivery time, location, status
//! - all four must succeed or the whole attempt is abandoned — no
//!   partial-field merging across capability calls
//! - a single attempt per call; no retries, no caching, no circuit breaking
//! - fetch failure never escapes this crate; callers always get a snapshot

pub mod synthetic;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::fmt;
use trk_schemas::{Carrier, CapabilityPayloads, DeliveryStatus, HistoryEvent, TrackingSnapshot};

use crate::synthetic::{synthetic_history, DESTINATION_HUB};

/// Default current location when neither the location nor the base-info
/// payload carries one.
pub const DEFAULT_LOCATION: &str = "물류 처리 센터";
/// Location filled into structured history items that omit one.
pub const UNKNOWN_LOCATION: &str = "알 수 없음";

// ---------------------------------------------------------------------------
// Error type (internal to the fetch path; absorbed before callers see it)
// ---------------------------------------------------------------------------

/// Why a live fetch attempt was abandoned. One variant per failure mode of a
/// single capability call; the first failing call wins (fail-fast).
#[derive(Debug)]
pub enum FetchError {
    /// The carrier has no URL configured for this capability.
    MissingEndpoint { capability: &'static str },
    /// Network or transport failure.
    Transport {
        capability: &'static str,
        message: String,
    },
    /// The endpoint answered with a non-success HTTP status.
    Status {
        capability: &'static str,
        status: u16,
    },
    /// The response body could not be decoded as JSON.
    Decode {
        capability: &'static str,
        message: String,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::MissingEndpoint { capability } => {
                write!(f, "no endpoint configured for capability {capability}")
            }
            FetchError::Transport {
                capability,
                message,
            } => write!(f, "transport error on {capability}: {message}"),
            FetchError::Status { capability, status } => {
                write!(f, "{capability} endpoint returned http status {status}")
            }
            FetchError::Decode {
                capability,
                message,
            } => write!(f, "decode error on {capability}: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

// ---------------------------------------------------------------------------
// Fetcher trait
// ---------------------------------------------------------------------------

/// External tracking data source contract.
///
/// Implementations must be object-safe so callers can hold an
/// `Arc<dyn TrackingFetcher>` without knowing the concrete type. `fetch` is
/// infallible by design: upstream failure resolves to a synthetic snapshot.
#[async_trait]
pub trait TrackingFetcher: Send + Sync {
    async fn fetch(&self, carrier: &Carrier, tracking_number: &str) -> TrackingSnapshot;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// reqwest-backed [`TrackingFetcher`] talking to a carrier's capability
/// endpoints. Stateless between calls.
#[derive(Debug, Clone, Default)]
pub struct HttpTrackingClient {
    http: reqwest::Client,
}

impl HttpTrackingClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// One authorized capability call.
    ///
    /// Upstream auth comes in two shapes: URLs that already embed the
    /// credential as a `key=` query parameter are used as-is; anything else
    /// gets a bearer header. Do not log the key either way.
    async fn capability_call(
        &self,
        capability: &'static str,
        url: &str,
        api_key: &str,
        tracking_number: &str,
    ) -> Result<Value, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::MissingEndpoint { capability });
        }

        let mut req = self
            .http
            .get(url)
            .query(&[("trackingNumber", tracking_number)]);
        if !url.contains("key=") {
            req = req.header(reqwest::header::AUTHORIZATION, format!("Bearer {api_key}"));
        }

        let resp = req.send().await.map_err(|err| FetchError::Transport {
            capability,
            message: err.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                capability,
                status: status.as_u16(),
            });
        }

        resp.json::<Value>().await.map_err(|err| FetchError::Decode {
            capability,
            message: err.to_string(),
        })
    }

    /// Attempt a live fetch. The four capability calls run concurrently and
    /// the first failure aborts the attempt.
    pub async fn fetch_live(
        &self,
        carrier: &Carrier,
        tracking_number: &str,
    ) -> Result<TrackingSnapshot, FetchError> {
        let (base_info, delivery_time, location, status) = tokio::try_join!(
            self.capability_call(
                "base_info",
                &carrier.tracking_info_url,
                &carrier.api_key,
                tracking_number,
            ),
            self.capability_call(
                "delivery_time",
                &carrier.delivery_time_url,
                &carrier.api_key,
                tracking_number,
            ),
            self.capability_call(
                "location",
                &carrier.location_url,
                &carrier.api_key,
                tracking_number,
            ),
            self.capability_call(
                "status",
                &carrier.status_url,
                &carrier.api_key,
                tracking_number,
            ),
        )?;

        Ok(normalize(
            base_info,
            delivery_time,
            location,
            status,
            tracking_number,
            Utc::now(),
        ))
    }
}

#[async_trait]
impl TrackingFetcher for HttpTrackingClient {
    async fn fetch(&self, carrier: &Carrier, tracking_number: &str) -> TrackingSnapshot {
        match self.fetch_live(carrier, tracking_number).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    carrier = %carrier.code,
                    error = %err,
                    "live fetch failed; falling back to synthetic tracking data"
                );
                fallback_snapshot(tracking_number, Utc::now())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization of a successful set of four payloads
// ---------------------------------------------------------------------------

fn normalize(
    base_info: Value,
    delivery_time: Value,
    location: Value,
    status: Value,
    tracking_number: &str,
    now: DateTime<Utc>,
) -> TrackingSnapshot {
    let history = extract_history(&base_info, now)
        .unwrap_or_else(|| synthetic_history(tracking_number, now));

    TrackingSnapshot {
        status: extract_status(&status, &base_info),
        current_location: extract_location(&location, &base_info),
        last_updated: now,
        history,
        raw: CapabilityPayloads {
            base_info,
            delivery_time,
            location,
            status,
        },
    }
}

/// Status precedence: status payload, then base-info payload, then the
/// in-transit default.
fn extract_status(status_info: &Value, base_info: &Value) -> DeliveryStatus {
    status_info
        .get("status")
        .and_then(Value::as_str)
        .or_else(|| base_info.get("status").and_then(Value::as_str))
        .map(DeliveryStatus::from_external)
        .unwrap_or(DeliveryStatus::InTransit)
}

/// Location precedence: location payload, then base-info payload, then the
/// processing-center default.
fn extract_location(location_info: &Value, base_info: &Value) -> String {
    location_info
        .get("location")
        .and_then(Value::as_str)
        .or_else(|| base_info.get("location").and_then(Value::as_str))
        .unwrap_or(DEFAULT_LOCATION)
        .to_string()
}

/// History precedence: structured `trackingDetails` list, then a raw
/// `history` array, else `None` (caller synthesizes).
fn extract_history(base_info: &Value, now: DateTime<Utc>) -> Option<Vec<HistoryEvent>> {
    let items = base_info
        .get("trackingDetails")
        .and_then(Value::as_array)
        .or_else(|| base_info.get("history").and_then(Value::as_array))?;

    Some(items.iter().map(|item| history_item(item, now)).collect())
}

/// Lenient per-item mapping with documented defaults: unparseable or missing
/// time becomes `now`, missing location `알 수 없음`, missing status the
/// in-transit default, missing description empty.
fn history_item(item: &Value, now: DateTime<Utc>) -> HistoryEvent {
    let time = item
        .get("time")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(now);

    HistoryEvent {
        time,
        location: item
            .get("location")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_LOCATION)
            .to_string(),
        status: item
            .get("status")
            .and_then(Value::as_str)
            .map(DeliveryStatus::from_external)
            .unwrap_or(DeliveryStatus::InTransit),
        description: item
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

// ---------------------------------------------------------------------------
// Synthetic fallback snapshot
// ---------------------------------------------------------------------------

/// Snapshot returned when the live attempt failed. Raw payloads are replaced
/// with fallback markers so the diagnostic view makes the substitution
/// obvious; the credential is deliberately not echoed anywhere.
pub fn fallback_snapshot(tracking_number: &str, now: DateTime<Utc>) -> TrackingSnapshot {
    let estimated = (now + Duration::days(2)).to_rfc3339_opts(SecondsFormat::Millis, true);

    TrackingSnapshot {
        status: DeliveryStatus::InTransit,
        current_location: DESTINATION_HUB.to_string(),
        last_updated: now,
        history: synthetic_history(tracking_number, now),
        raw: CapabilityPayloads {
            base_info: json!({
                "fallback": true,
                "message": "업스트림 응답이 없어 가상 데이터를 표시합니다."
            }),
            delivery_time: json!({ "estimatedDelivery": estimated }),
            location: json!({ "location": DESTINATION_HUB }),
            status: json!({ "status": "배송중", "statusCode": "in_transit" }),
        },
    }
}
