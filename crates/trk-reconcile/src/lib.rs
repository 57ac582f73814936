//! trk-reconcile
//!
//! Reconciliation Engine: merges a fresh tracking snapshot into the stored
//! record for a `(carrier, tracking_number)` pair.
//!
//! Architectural decisions:
//! - status / current_location / last_updated are overwritten unconditionally
//! - history is append-only; existing entries are never edited or reordered
//! - new events are deduplicated by canonical timestamp string
//! - surviving events are appended in snapshot order, after all existing ones
//!   (no chronological interleave — deliberate, see DESIGN.md)
//!
//! Deterministic, pure logic. No IO. No store or carrier calls.

mod engine;

pub use engine::{canonical_time, reconcile, ReconcileOutcome};
