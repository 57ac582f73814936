//! trk-db
//!
//! Tracking Store and Carrier Directory over PostgreSQL. Owns the storage
//! traits the daemon consumes; the in-memory counterparts for tests live in
//! trk-testkit. The `(carrier_id, tracking_number)` uniqueness constraint is
//! enforced here by the `uq_tracking_carrier_number` index, never by
//! application locking.

pub mod seed;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::fmt;
use trk_schemas::{Carrier, DeliveryStatus, TrackingRecord};
use uuid::Uuid;

pub const ENV_DB_URL: &str = "TRK_DATABASE_URL";

/// Connect to Postgres using TRK_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Storage-layer failure modes the service layer cares about.
#[derive(Debug)]
pub enum StoreError {
    /// A `(carrier_id, tracking_number)` pair already exists.
    Duplicate,
    /// Anything else: connectivity, malformed row, constraint other than the
    /// pair index.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate => write!(f, "tracking record already exists for this pair"),
            StoreError::Backend(msg) => write!(f, "store backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Detect a Postgres unique constraint violation by name. SQLSTATE 23505 is
/// checked as well since the constraint name is not always reported.
fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.constraint() == Some(constraint)
                || db_err.code().as_deref() == Some("23505")
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Storage traits
// ---------------------------------------------------------------------------

/// Read-side registry of known carriers.
#[async_trait]
pub trait CarrierDirectory: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Carrier>, StoreError>;

    /// All carriers, sorted by name.
    async fn list_all(&self) -> Result<Vec<Carrier>, StoreError>;
}

/// Persistence for tracking records, one per `(carrier_id, tracking_number)`.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    async fn find_by_carrier_and_number(
        &self,
        carrier_id: Uuid,
        tracking_number: &str,
    ) -> Result<Option<TrackingRecord>, StoreError>;

    /// Create-only insert; [`StoreError::Duplicate`] when the pair exists.
    async fn create(&self, record: &TrackingRecord) -> Result<TrackingRecord, StoreError>;

    /// Persist an updated record (matched by id).
    async fn save(&self, record: &TrackingRecord) -> Result<TrackingRecord, StoreError>;
}

// ---------------------------------------------------------------------------
// Postgres implementations
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgCarrierDirectory {
    pool: PgPool,
}

impl PgCarrierDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn carrier_from_row(row: &PgRow) -> Result<Carrier, StoreError> {
    Ok(Carrier {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        tracking_url: row.try_get("tracking_url")?,
        tracking_info_url: row.try_get("tracking_info_url")?,
        delivery_time_url: row.try_get("delivery_time_url")?,
        location_url: row.try_get("location_url")?,
        status_url: row.try_get("status_url")?,
        api_key: row.try_get("api_key")?,
        api_key_url: row.try_get("api_key_url")?,
    })
}

const CARRIER_COLUMNS: &str = "id, name, code, tracking_url, tracking_info_url, \
     delivery_time_url, location_url, status_url, api_key, api_key_url";

#[async_trait]
impl CarrierDirectory for PgCarrierDirectory {
    async fn find_by_code(&self, code: &str) -> Result<Option<Carrier>, StoreError> {
        let row = sqlx::query(&format!(
            "select {CARRIER_COLUMNS} from carriers where code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(carrier_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Carrier>, StoreError> {
        let rows = sqlx::query(&format!(
            "select {CARRIER_COLUMNS} from carriers order by name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(carrier_from_row).collect()
    }
}

#[derive(Clone)]
pub struct PgTrackingStore {
    pool: PgPool,
}

impl PgTrackingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<TrackingRecord, StoreError> {
    let status_raw: String = row.try_get("status")?;
    let history_raw: Value = row.try_get("history")?;

    Ok(TrackingRecord {
        id: row.try_get("id")?,
        carrier_id: row.try_get("carrier_id")?,
        tracking_number: row.try_get("tracking_number")?,
        status: DeliveryStatus::parse(&status_raw).map_err(StoreError::Backend)?,
        current_location: row.try_get("current_location")?,
        last_updated: row.try_get("last_updated")?,
        history: serde_json::from_value(history_raw)
            .map_err(|err| StoreError::Backend(format!("history column decode: {err}")))?,
    })
}

fn history_json(record: &TrackingRecord) -> Result<Value, StoreError> {
    serde_json::to_value(&record.history)
        .map_err(|err| StoreError::Backend(format!("history encode: {err}")))
}

#[async_trait]
impl TrackingStore for PgTrackingStore {
    async fn find_by_carrier_and_number(
        &self,
        carrier_id: Uuid,
        tracking_number: &str,
    ) -> Result<Option<TrackingRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            select id, carrier_id, tracking_number, status, current_location,
                   last_updated, history
            from tracking_records
            where carrier_id = $1 and tracking_number = $2
            "#,
        )
        .bind(carrier_id)
        .bind(tracking_number)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn create(&self, record: &TrackingRecord) -> Result<TrackingRecord, StoreError> {
        let res = sqlx::query(
            r#"
            insert into tracking_records (
              id, carrier_id, tracking_number, status, current_location,
              last_updated, history
            ) values (
              $1, $2, $3, $4, $5, $6, $7
            )
            "#,
        )
        .bind(record.id)
        .bind(record.carrier_id)
        .bind(&record.tracking_number)
        .bind(record.status.as_str())
        .bind(&record.current_location)
        .bind(record.last_updated)
        .bind(history_json(record)?)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(record.clone()),
            Err(err) if is_unique_violation(&err, "uq_tracking_carrier_number") => {
                Err(StoreError::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, record: &TrackingRecord) -> Result<TrackingRecord, StoreError> {
        sqlx::query(
            r#"
            update tracking_records
            set status = $2,
                current_location = $3,
                last_updated = $4,
                history = $5
            where id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.status.as_str())
        .bind(&record.current_location)
        .bind(record.last_updated)
        .bind(history_json(record)?)
        .execute(&self.pool)
        .await?;

        Ok(record.clone())
    }
}
