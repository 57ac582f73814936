//! Entrypoint business logic: lookup (upsert) and registration (create-only).
//!
//! Handlers in `routes.rs` stay thin; everything that touches the directory,
//! the fetcher, the reconciler and the store lives here. Fetch failures never
//! surface — the fetcher resolves them to a synthetic snapshot internally —
//! so the error taxonomy below is entirely about input, directory and
//! persistence problems.

use std::fmt;

use tracing::info;
use trk_db::StoreError;
use trk_reconcile::reconcile;
use trk_schemas::{CapabilityPayloads, TrackingRecord};

use crate::state::AppState;

/// Entrypoint failure modes, mapped to HTTP status classes in `api_types`.
#[derive(Debug)]
pub enum ServiceError {
    /// A required parameter is absent or blank.
    MissingParameter(&'static str),
    /// No carrier with the given code exists.
    UnknownCarrier(String),
    /// Registration hit an existing `(carrier, tracking_number)` pair.
    DuplicateTrackingNumber,
    /// Storage-layer failure.
    Persistence(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::MissingParameter(name) => {
                write!(f, "missing required parameter: {name}")
            }
            ServiceError::UnknownCarrier(code) => write!(f, "unknown carrier: {code}"),
            ServiceError::DuplicateTrackingNumber => {
                write!(f, "tracking number already registered for this carrier")
            }
            ServiceError::Persistence(msg) => write!(f, "persistence failure: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Lookup result: the reconciled record plus the snapshot's raw capability
/// payloads for diagnostics.
pub struct LookupOutcome {
    pub record: TrackingRecord,
    pub api_data: CapabilityPayloads,
}

fn required<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::MissingParameter(name));
    }
    Ok(trimmed)
}

/// Lookup entrypoint (upsert path).
///
/// Fetches fresh data, reconciles it against the stored record (if any) and
/// persists the result. A create that loses a concurrent race on the unique
/// pair index is reported as a persistence failure, not a duplicate: the
/// caller asked to look up, not to register.
pub async fn lookup(
    state: &AppState,
    carrier_code: &str,
    tracking_number: &str,
) -> Result<LookupOutcome, ServiceError> {
    let carrier_code = required("carrier", carrier_code)?;
    let tracking_number = required("tracking_number", tracking_number)?;

    let carrier = state
        .directory
        .find_by_code(carrier_code)
        .await
        .map_err(|err| ServiceError::Persistence(err.to_string()))?
        .ok_or_else(|| ServiceError::UnknownCarrier(carrier_code.to_string()))?;

    let snapshot = state.fetcher.fetch(&carrier, tracking_number).await;

    let existing = state
        .store
        .find_by_carrier_and_number(carrier.id, tracking_number)
        .await
        .map_err(|err| ServiceError::Persistence(err.to_string()))?;

    let outcome = reconcile(carrier.id, tracking_number, &snapshot, existing);

    let record = if outcome.created {
        state.store.create(&outcome.record).await
    } else {
        state.store.save(&outcome.record).await
    }
    .map_err(|err| ServiceError::Persistence(err.to_string()))?;

    info!(
        carrier = %carrier.code,
        created = outcome.created,
        appended = outcome.appended,
        "tracking lookup reconciled"
    );

    Ok(LookupOutcome {
        record,
        api_data: snapshot.raw,
    })
}

/// Registration entrypoint (create-only).
///
/// Pre-checks the pair for a friendly conflict answer, but the authoritative
/// duplicate detection is the store's unique index: a concurrent registration
/// between check and insert still comes back as a duplicate.
pub async fn register(
    state: &AppState,
    carrier_code: &str,
    tracking_number: &str,
) -> Result<TrackingRecord, ServiceError> {
    let carrier_code = required("carrier_code", carrier_code)?;
    let tracking_number = required("tracking_number", tracking_number)?;

    let carrier = state
        .directory
        .find_by_code(carrier_code)
        .await
        .map_err(|err| ServiceError::Persistence(err.to_string()))?
        .ok_or_else(|| ServiceError::UnknownCarrier(carrier_code.to_string()))?;

    let existing = state
        .store
        .find_by_carrier_and_number(carrier.id, tracking_number)
        .await
        .map_err(|err| ServiceError::Persistence(err.to_string()))?;
    if existing.is_some() {
        return Err(ServiceError::DuplicateTrackingNumber);
    }

    let snapshot = state.fetcher.fetch(&carrier, tracking_number).await;
    let outcome = reconcile(carrier.id, tracking_number, &snapshot, None);

    let record = match state.store.create(&outcome.record).await {
        Ok(record) => record,
        Err(StoreError::Duplicate) => return Err(ServiceError::DuplicateTrackingNumber),
        Err(err) => return Err(ServiceError::Persistence(err.to_string())),
    };

    info!(carrier = %carrier.code, "tracking number registered");

    Ok(record)
}
