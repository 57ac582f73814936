use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use trk_schemas::{TrackingRecord, TrackingSnapshot};
use uuid::Uuid;

/// Canonical instant rendering used as the history-event identity key.
///
/// RFC 3339 UTC with millisecond precision and a `Z` suffix, matching the
/// upstream API's timestamp format. Two events are "the same" iff these
/// strings are identical.
pub fn canonical_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Result of one reconcile pass.
#[derive(Clone, Debug)]
pub struct ReconcileOutcome {
    pub record: TrackingRecord,
    /// True when no stored record existed and a fresh one was built (Case A).
    pub created: bool,
    /// Number of snapshot events that survived deduplication.
    pub appended: usize,
}

/// Merge `snapshot` into the record for `(carrier_id, tracking_number)`.
///
/// Case A (`existing` is `None`): build a brand-new record carrying the
/// snapshot's status, location, timestamp and full history in snapshot order.
///
/// Case B: overwrite status / current_location / last_updated, then append
/// only those snapshot events whose canonical timestamp is not already in the
/// stored history. Running the same snapshot through twice is a no-op for
/// history length.
pub fn reconcile(
    carrier_id: Uuid,
    tracking_number: &str,
    snapshot: &TrackingSnapshot,
    existing: Option<TrackingRecord>,
) -> ReconcileOutcome {
    match existing {
        None => {
            let appended = snapshot.history.len();
            ReconcileOutcome {
                record: TrackingRecord {
                    id: Uuid::new_v4(),
                    carrier_id,
                    tracking_number: tracking_number.to_string(),
                    status: snapshot.status,
                    current_location: snapshot.current_location.clone(),
                    last_updated: snapshot.last_updated,
                    history: snapshot.history.clone(),
                },
                created: true,
                appended,
            }
        }
        Some(mut record) => {
            record.status = snapshot.status;
            record.current_location = snapshot.current_location.clone();
            record.last_updated = snapshot.last_updated;

            let seen: BTreeSet<String> = record
                .history
                .iter()
                .map(|ev| canonical_time(&ev.time))
                .collect();

            let mut appended = 0;
            for ev in &snapshot.history {
                if !seen.contains(&canonical_time(&ev.time)) {
                    record.history.push(ev.clone());
                    appended += 1;
                }
            }

            ReconcileOutcome {
                record,
                created: false,
                appended,
            }
        }
    }
}
