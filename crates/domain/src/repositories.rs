//! Repository traits the services depend on.
//!
//! The persistence crate provides Postgres-backed implementations; tests use
//! in-memory fakes. Every write that can race carries its concurrency rule in
//! the trait contract so both implementations enforce the same semantics.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{
    Dispatch, DriverAvailability, DriverLocation, GeofenceAlert, GeofenceAlertType, HosLog,
    HosLogSource, HosStatus, HosViolation, HosViolationType, Load, LoadStatus, LoadStatusHistory,
    ViolationSeverity,
};

// ============================================================================
// Insert payloads
// ============================================================================

/// Insert payload for a status-history row. The id is database-assigned.
#[derive(Debug, Clone)]
pub struct NewStatusHistory {
    pub load_id: Uuid,
    pub previous_status: LoadStatus,
    pub new_status: LoadStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    pub automatic: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reason: Option<String>,
}

/// Insert payload for a location ping.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub dispatch_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
    pub source: String,
}

/// Insert payload for a geofence alert.
#[derive(Debug, Clone)]
pub struct NewGeofenceAlert {
    pub alert_type: GeofenceAlertType,
    pub driver_id: Uuid,
    pub dispatch_id: Uuid,
    pub location_id: i64,
}

/// Insert payload for a duty log.
#[derive(Debug, Clone)]
pub struct NewHosLog {
    pub driver_id: Uuid,
    pub status: HosStatus,
    pub start_time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub odometer: Option<f64>,
    pub source: HosLogSource,
}

/// Insert payload for a detected violation.
#[derive(Debug, Clone)]
pub struct NewHosViolation {
    pub driver_id: Uuid,
    pub violation_type: HosViolationType,
    pub severity: ViolationSeverity,
    pub actual_hours: f64,
    pub limit_hours: f64,
    pub overage_hours: f64,
}

// ============================================================================
// Traits
// ============================================================================

#[async_trait::async_trait]
pub trait LoadRepository: Send + Sync {
    async fn get(&self, load_id: Uuid) -> Result<Option<Load>, DomainError>;

    /// Persists the load if its `version` still matches the stored row, then
    /// bumps the version. Returns `Conflict` when another writer got there
    /// first.
    async fn update(&self, load: &Load) -> Result<Load, DomainError>;

    async fn append_history(
        &self,
        entry: NewStatusHistory,
    ) -> Result<LoadStatusHistory, DomainError>;

    /// Full audit trail for a load, oldest first.
    async fn history(&self, load_id: Uuid) -> Result<Vec<LoadStatusHistory>, DomainError>;
}

#[async_trait::async_trait]
pub trait DispatchRepository: Send + Sync {
    async fn get(&self, dispatch_id: Uuid) -> Result<Option<Dispatch>, DomainError>;

    /// The load's non-terminal dispatch, if one exists. At most one is active
    /// per load at any time.
    async fn get_active_by_load(&self, load_id: Uuid) -> Result<Option<Dispatch>, DomainError>;

    /// The driver's non-terminal dispatch, if one exists.
    async fn get_active_by_driver(&self, driver_id: Uuid)
        -> Result<Option<Dispatch>, DomainError>;

    /// Inserts the dispatch. Returns `Conflict` if the load already has an
    /// active dispatch.
    async fn create(&self, dispatch: &Dispatch) -> Result<Dispatch, DomainError>;

    async fn update(&self, dispatch: &Dispatch) -> Result<Dispatch, DomainError>;
}

#[async_trait::async_trait]
pub trait DriverAvailabilityRepository: Send + Sync {
    async fn get(&self, driver_id: Uuid) -> Result<Option<DriverAvailability>, DomainError>;

    async fn update(
        &self,
        availability: &DriverAvailability,
    ) -> Result<DriverAvailability, DomainError>;

    /// All drivers in `AVAILABLE` status, for the auto-match candidate pool.
    async fn list_available(&self) -> Result<Vec<DriverAvailability>, DomainError>;
}

#[async_trait::async_trait]
pub trait LocationRepository: Send + Sync {
    async fn append(&self, location: NewLocation) -> Result<DriverLocation, DomainError>;

    async fn latest_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Option<DriverLocation>, DomainError>;

    /// Pings recorded at or after `since`, oldest first.
    async fn history(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DriverLocation>, DomainError>;

    /// Latest ping per driver that has a dispatch attached.
    async fn active_trackers(&self) -> Result<Vec<DriverLocation>, DomainError>;
}

#[async_trait::async_trait]
pub trait GeofenceAlertRepository: Send + Sync {
    async fn append(&self, alert: NewGeofenceAlert) -> Result<GeofenceAlert, DomainError>;

    async fn get(&self, alert_id: Uuid) -> Result<Option<GeofenceAlert>, DomainError>;

    /// Unacknowledged alerts, newest first.
    async fn pending(&self) -> Result<Vec<GeofenceAlert>, DomainError>;

    /// Marks the alert acknowledged. Idempotent: re-acknowledging returns the
    /// row unchanged.
    async fn acknowledge(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
        acknowledged_at: DateTime<Utc>,
    ) -> Result<GeofenceAlert, DomainError>;
}

#[async_trait::async_trait]
pub trait NoteRepository: Send + Sync {
    async fn append(&self, note: &crate::models::Note) -> Result<crate::models::Note, DomainError>;

    /// Notes attached to one owner, newest first.
    async fn list_by_owner(
        &self,
        owner: crate::models::NoteOwner,
    ) -> Result<Vec<crate::models::Note>, DomainError>;
}

#[async_trait::async_trait]
pub trait HosRepository: Send + Sync {
    /// The driver's open log (`end_time IS NULL`), if any. At most one exists.
    async fn active_log(&self, driver_id: Uuid) -> Result<Option<HosLog>, DomainError>;

    async fn get_log(&self, log_id: Uuid) -> Result<Option<HosLog>, DomainError>;

    async fn append_log(&self, log: NewHosLog) -> Result<HosLog, DomainError>;

    /// Stamps `end_time` on an open log.
    async fn close_log(
        &self,
        log_id: Uuid,
        end_time: DateTime<Utc>,
    ) -> Result<HosLog, DomainError>;

    async fn update_log(&self, log: &HosLog) -> Result<HosLog, DomainError>;

    /// Logs overlapping the window `[since, now]`, oldest first. A log
    /// overlaps when it ends after `since` (or is still open).
    async fn logs_since(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<HosLog>, DomainError>;

    async fn append_violation(
        &self,
        violation: NewHosViolation,
    ) -> Result<HosViolation, DomainError>;

    async fn get_violation(&self, violation_id: Uuid)
        -> Result<Option<HosViolation>, DomainError>;

    /// The driver's unresolved violations, newest first.
    async fn unresolved_violations(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<HosViolation>, DomainError>;

    async fn resolve_violation(
        &self,
        violation_id: Uuid,
        note: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<HosViolation, DomainError>;
}
