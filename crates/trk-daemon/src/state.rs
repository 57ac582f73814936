//! Shared runtime state for trk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The state holds trait
//! objects only, so tests swap in the in-memory doubles from trk-testkit
//! without touching the router.

use std::sync::Arc;

use serde::Serialize;
use trk_carrier::TrackingFetcher;
use trk_db::{CarrierDirectory, TrackingStore};

/// Static build metadata included in the health response.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry of known carriers.
    pub directory: Arc<dyn CarrierDirectory>,
    /// Persistence for tracking records.
    pub store: Arc<dyn TrackingStore>,
    /// External tracking data source (live HTTP client in production).
    pub fetcher: Arc<dyn TrackingFetcher>,
    /// Static build metadata.
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn CarrierDirectory>,
        store: Arc<dyn TrackingStore>,
        fetcher: Arc<dyn TrackingFetcher>,
    ) -> Self {
        Self {
            directory,
            store,
            fetcher,
            build: BuildInfo {
                service: "trk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
