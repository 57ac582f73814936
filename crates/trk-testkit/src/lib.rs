//! trk-testkit
//!
//! In-memory doubles for scenario tests: a carrier directory and tracking
//! store backed by plain collections, plus a stub fetcher that returns a
//! canned snapshot. Daemon tests run against these without Postgres or a
//! network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use trk_carrier::TrackingFetcher;
use trk_db::{CarrierDirectory, StoreError, TrackingStore};
use trk_schemas::{Carrier, TrackingRecord, TrackingSnapshot};
use uuid::Uuid;

/// Fixed set of carriers, resolved by code.
pub struct MemoryCarrierDirectory {
    carriers: Vec<Carrier>,
}

impl MemoryCarrierDirectory {
    pub fn new(carriers: Vec<Carrier>) -> Self {
        Self { carriers }
    }
}

#[async_trait]
impl CarrierDirectory for MemoryCarrierDirectory {
    async fn find_by_code(&self, code: &str) -> Result<Option<Carrier>, StoreError> {
        Ok(self.carriers.iter().find(|c| c.code == code).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Carrier>, StoreError> {
        let mut out = self.carriers.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

/// Tracking store over a mutex-guarded map, keyed by the same
/// `(carrier_id, tracking_number)` pair the Postgres index enforces.
#[derive(Default)]
pub struct MemoryTrackingStore {
    records: Mutex<HashMap<(Uuid, String), TrackingRecord>>,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of stored records; lets tests assert a failed request left the
    /// store untouched.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TrackingStore for MemoryTrackingStore {
    async fn find_by_carrier_and_number(
        &self,
        carrier_id: Uuid,
        tracking_number: &str,
    ) -> Result<Option<TrackingRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(&(carrier_id, tracking_number.to_string()))
            .cloned())
    }

    async fn create(&self, record: &TrackingRecord) -> Result<TrackingRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let key = (record.carrier_id, record.tracking_number.clone());
        if records.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }
        records.insert(key, record.clone());
        Ok(record.clone())
    }

    async fn save(&self, record: &TrackingRecord) -> Result<TrackingRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let key = (record.carrier_id, record.tracking_number.clone());
        records.insert(key, record.clone());
        Ok(record.clone())
    }
}

/// Fetcher that always returns the same snapshot, for deterministic
/// reconciliation tests.
pub struct StubFetcher {
    snapshot: TrackingSnapshot,
}

impl StubFetcher {
    pub fn new(snapshot: TrackingSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl TrackingFetcher for StubFetcher {
    async fn fetch(&self, _carrier: &Carrier, _tracking_number: &str) -> TrackingSnapshot {
        self.snapshot.clone()
    }
}

/// A carrier with no capability endpoints configured. Fetching through the
/// real HTTP client against one of these always takes the synthetic path.
pub fn offline_carrier(name: &str, code: &str) -> Carrier {
    Carrier {
        id: Uuid::new_v4(),
        name: name.to_string(),
        code: code.to_string(),
        tracking_url: String::new(),
        tracking_info_url: String::new(),
        delivery_time_url: String::new(),
        location_url: String::new(),
        status_url: String::new(),
        api_key: String::new(),
        api_key_url: String::new(),
    }
}
