use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Delivery status vocabulary shared by every carrier.
///
/// The wire representation is the Korean status string used by the upstream
/// carrier APIs; the enum is the closed set the store accepts. External
/// strings outside the set normalize to [`DeliveryStatus::InTransit`] via
/// [`DeliveryStatus::from_external`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "발송준비중")]
    Preparing,
    #[serde(rename = "집화완료")]
    Collected,
    #[serde(rename = "배송중")]
    InTransit,
    #[serde(rename = "배송완료")]
    Delivered,
    #[serde(rename = "배송실패")]
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Preparing => "발송준비중",
            DeliveryStatus::Collected => "집화완료",
            DeliveryStatus::InTransit => "배송중",
            DeliveryStatus::Delivered => "배송완료",
            DeliveryStatus::Failed => "배송실패",
        }
    }

    /// Strict parse for values we wrote ourselves (store round-trips).
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "발송준비중" => Ok(DeliveryStatus::Preparing),
            "집화완료" => Ok(DeliveryStatus::Collected),
            "배송중" => Ok(DeliveryStatus::InTransit),
            "배송완료" => Ok(DeliveryStatus::Delivered),
            "배송실패" => Ok(DeliveryStatus::Failed),
            other => Err(format!("invalid delivery status: {other}")),
        }
    }

    /// Lenient mapping for upstream payloads: anything outside the closed
    /// set becomes the in-transit default.
    pub fn from_external(s: &str) -> Self {
        Self::parse(s).unwrap_or(DeliveryStatus::InTransit)
    }
}

/// A delivery carrier and its capability endpoint configuration.
///
/// `code` is the stable unique key; the four capability URLs point at the
/// upstream tracking API and may embed the credential as a `key=` query
/// parameter. `api_key` must never appear in logs or API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    /// Human-facing deep-link template (tracking number appended by the UI).
    pub tracking_url: String,
    /// Capability endpoint: base tracking info.
    pub tracking_info_url: String,
    /// Capability endpoint: estimated delivery time.
    pub delivery_time_url: String,
    /// Capability endpoint: current location.
    pub location_url: String,
    /// Capability endpoint: delivery status.
    pub status_url: String,
    pub api_key: String,
    pub api_key_url: String,
}

/// One recorded shipment milestone.
///
/// Identity for deduplication is the `time` value alone, compared through its
/// canonical RFC 3339 millisecond rendering (see trk-reconcile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub time: DateTime<Utc>,
    pub location: String,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub description: String,
}

/// One shipment's persisted state. At most one record exists per
/// `(carrier_id, tracking_number)` pair; the store enforces that with a
/// unique index, not application locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub id: Uuid,
    pub carrier_id: Uuid,
    pub tracking_number: String,
    pub status: DeliveryStatus,
    pub current_location: String,
    pub last_updated: DateTime<Utc>,
    /// Append-only in practice: existing entries are never edited or removed.
    pub history: Vec<HistoryEvent>,
}

/// Raw per-capability payloads from one fetch attempt. Diagnostic only —
/// surfaced to the caller, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityPayloads {
    pub base_info: Value,
    pub delivery_time: Value,
    pub location: Value,
    pub status: Value,
}

/// Normalized result of one fetch attempt (live or synthetic), not yet
/// merged into storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub status: DeliveryStatus,
    pub current_location: String,
    pub last_updated: DateTime<Utc>,
    pub history: Vec<HistoryEvent>,
    pub raw: CapabilityPayloads,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            DeliveryStatus::Preparing,
            DeliveryStatus::Collected,
            DeliveryStatus::InTransit,
            DeliveryStatus::Delivered,
            DeliveryStatus::Failed,
        ] {
            assert_eq!(DeliveryStatus::parse(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn unknown_external_status_defaults_to_in_transit() {
        assert_eq!(
            DeliveryStatus::from_external("out_for_delivery"),
            DeliveryStatus::InTransit
        );
        assert_eq!(DeliveryStatus::from_external(""), DeliveryStatus::InTransit);
    }

    #[test]
    fn status_serializes_as_korean_string() {
        let json = serde_json::to_string(&DeliveryStatus::Collected).unwrap();
        assert_eq!(json, "\"집화완료\"");
    }

    #[test]
    fn history_event_description_defaults_to_empty() {
        let ev: HistoryEvent = serde_json::from_value(serde_json::json!({
            "time": "2026-08-01T00:00:00Z",
            "location": "물류 센터",
            "status": "배송중"
        }))
        .unwrap();
        assert_eq!(ev.description, "");
    }
}
