//! In-memory repository fakes and fixtures for service integration tests.
//!
//! The fakes enforce the same concurrency contracts as the Postgres
//! implementations (version checks, one-active-per-load, one-open-log) so the
//! services exercise identical paths in both environments.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use domain::config::{DispatchConfig, HosConfig, TrackingConfig};
use domain::error::DomainError;
use domain::models::{
    AvailabilityStatus, Dispatch, DriverAvailability, DriverLocation, GeofenceAlert, HosLog,
    HosViolation, Load, LoadStatus, LoadStatusHistory, Stop,
};
use domain::repositories::{
    DispatchRepository, DriverAvailabilityRepository, GeofenceAlertRepository, HosRepository,
    LoadRepository, LocationRepository, NewGeofenceAlert, NewHosLog, NewHosViolation, NewLocation,
    NewStatusHistory,
};
use domain::services::{
    DispatchService, HosService, LoadStatusService, TrackingGateway, TrackingService,
};

// Boise downtown and Salt Lake City, the canonical pickup/delivery pair.
pub const PICKUP: (f64, f64) = (43.6150, -116.2023);
pub const DELIVERY: (f64, f64) = (40.7608, -111.8910);

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
pub struct InMemoryLoadRepository {
    loads: Mutex<HashMap<Uuid, Load>>,
    history: Mutex<Vec<LoadStatusHistory>>,
    next_history_id: AtomicI64,
}

impl InMemoryLoadRepository {
    pub fn seed(&self, load: Load) {
        self.loads.lock().unwrap().insert(load.load_id, load);
    }
}

#[async_trait::async_trait]
impl LoadRepository for InMemoryLoadRepository {
    async fn get(&self, load_id: Uuid) -> Result<Option<Load>, DomainError> {
        Ok(self.loads.lock().unwrap().get(&load_id).cloned())
    }

    async fn update(&self, load: &Load) -> Result<Load, DomainError> {
        let mut loads = self.loads.lock().unwrap();
        let stored = loads
            .get_mut(&load.load_id)
            .ok_or_else(|| DomainError::NotFound(format!("Load {} not found", load.load_id)))?;
        if stored.version != load.version {
            return Err(DomainError::Conflict(format!(
                "Load {} was modified concurrently",
                load.load_id
            )));
        }
        let mut updated = load.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn append_history(
        &self,
        entry: NewStatusHistory,
    ) -> Result<LoadStatusHistory, DomainError> {
        let id = self.next_history_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = LoadStatusHistory {
            id,
            load_id: entry.load_id,
            previous_status: entry.previous_status,
            new_status: entry.new_status,
            changed_at: entry.changed_at,
            changed_by: entry.changed_by,
            automatic: entry.automatic,
            latitude: entry.latitude,
            longitude: entry.longitude,
            reason: entry.reason,
        };
        self.history.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn history(&self, load_id: Uuid) -> Result<Vec<LoadStatusHistory>, DomainError> {
        let mut rows: Vec<LoadStatusHistory> = self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.load_id == load_id)
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.id);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryDispatchRepository {
    dispatches: Mutex<HashMap<Uuid, Dispatch>>,
}

#[async_trait::async_trait]
impl DispatchRepository for InMemoryDispatchRepository {
    async fn get(&self, dispatch_id: Uuid) -> Result<Option<Dispatch>, DomainError> {
        Ok(self.dispatches.lock().unwrap().get(&dispatch_id).cloned())
    }

    async fn get_active_by_load(&self, load_id: Uuid) -> Result<Option<Dispatch>, DomainError> {
        Ok(self
            .dispatches
            .lock()
            .unwrap()
            .values()
            .find(|d| d.load_id == load_id && !d.status.is_terminal())
            .cloned())
    }

    async fn get_active_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Option<Dispatch>, DomainError> {
        Ok(self
            .dispatches
            .lock()
            .unwrap()
            .values()
            .find(|d| d.driver_id == driver_id && !d.status.is_terminal())
            .cloned())
    }

    async fn create(&self, dispatch: &Dispatch) -> Result<Dispatch, DomainError> {
        let mut dispatches = self.dispatches.lock().unwrap();
        if dispatches
            .values()
            .any(|d| d.load_id == dispatch.load_id && !d.status.is_terminal())
        {
            return Err(DomainError::Conflict(format!(
                "Load {} already has an active dispatch",
                dispatch.load_id
            )));
        }
        dispatches.insert(dispatch.dispatch_id, dispatch.clone());
        Ok(dispatch.clone())
    }

    async fn update(&self, dispatch: &Dispatch) -> Result<Dispatch, DomainError> {
        let mut dispatches = self.dispatches.lock().unwrap();
        if !dispatches.contains_key(&dispatch.dispatch_id) {
            return Err(DomainError::NotFound(format!(
                "Dispatch {} not found",
                dispatch.dispatch_id
            )));
        }
        dispatches.insert(dispatch.dispatch_id, dispatch.clone());
        Ok(dispatch.clone())
    }
}

#[derive(Default)]
pub struct InMemoryAvailabilityRepository {
    drivers: Mutex<HashMap<Uuid, DriverAvailability>>,
}

impl InMemoryAvailabilityRepository {
    pub fn seed(&self, availability: DriverAvailability) {
        self.drivers
            .lock()
            .unwrap()
            .insert(availability.driver_id, availability);
    }
}

#[async_trait::async_trait]
impl DriverAvailabilityRepository for InMemoryAvailabilityRepository {
    async fn get(&self, driver_id: Uuid) -> Result<Option<DriverAvailability>, DomainError> {
        Ok(self.drivers.lock().unwrap().get(&driver_id).cloned())
    }

    async fn update(
        &self,
        availability: &DriverAvailability,
    ) -> Result<DriverAvailability, DomainError> {
        self.drivers
            .lock()
            .unwrap()
            .insert(availability.driver_id, availability.clone());
        Ok(availability.clone())
    }

    async fn list_available(&self) -> Result<Vec<DriverAvailability>, DomainError> {
        Ok(self
            .drivers
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.status == AvailabilityStatus::Available)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryLocationRepository {
    rows: Mutex<Vec<DriverLocation>>,
    next_id: AtomicI64,
}

#[async_trait::async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn append(&self, location: NewLocation) -> Result<DriverLocation, DomainError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = DriverLocation {
            id,
            driver_id: location.driver_id,
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy: location.accuracy,
            speed: location.speed,
            heading: location.heading,
            dispatch_id: location.dispatch_id,
            recorded_at: location.recorded_at,
            source: location.source,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn latest_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Option<DriverLocation>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.driver_id == driver_id)
            .max_by_key(|r| (r.recorded_at, r.id))
            .cloned())
    }

    async fn history(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DriverLocation>, DomainError> {
        let mut rows: Vec<DriverLocation> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.driver_id == driver_id && r.recorded_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.recorded_at, r.id));
        Ok(rows)
    }

    async fn active_trackers(&self) -> Result<Vec<DriverLocation>, DomainError> {
        let rows = self.rows.lock().unwrap();
        let mut latest: HashMap<Uuid, DriverLocation> = HashMap::new();
        for row in rows.iter().filter(|r| r.dispatch_id.is_some()) {
            match latest.get(&row.driver_id) {
                Some(existing) if (existing.recorded_at, existing.id) >= (row.recorded_at, row.id) => {}
                _ => {
                    latest.insert(row.driver_id, row.clone());
                }
            }
        }
        Ok(latest.into_values().collect())
    }
}

#[derive(Default)]
pub struct InMemoryAlertRepository {
    rows: Mutex<Vec<GeofenceAlert>>,
}

#[async_trait::async_trait]
impl GeofenceAlertRepository for InMemoryAlertRepository {
    async fn append(&self, alert: NewGeofenceAlert) -> Result<GeofenceAlert, DomainError> {
        let row = GeofenceAlert {
            alert_id: Uuid::new_v4(),
            alert_type: alert.alert_type,
            driver_id: alert.driver_id,
            dispatch_id: alert.dispatch_id,
            location_id: alert.location_id,
            created_at: Utc::now(),
            acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn get(&self, alert_id: Uuid) -> Result<Option<GeofenceAlert>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.alert_id == alert_id)
            .cloned())
    }

    async fn pending(&self) -> Result<Vec<GeofenceAlert>, DomainError> {
        let mut rows: Vec<GeofenceAlert> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn acknowledge(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
        acknowledged_at: DateTime<Utc>,
    ) -> Result<GeofenceAlert, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        let alert = rows
            .iter_mut()
            .find(|a| a.alert_id == alert_id)
            .ok_or_else(|| DomainError::NotFound(format!("Alert {} not found", alert_id)))?;
        if !alert.acknowledged {
            alert.acknowledged = true;
            alert.acknowledged_by = Some(acknowledged_by.to_string());
            alert.acknowledged_at = Some(acknowledged_at);
        }
        Ok(alert.clone())
    }
}

#[derive(Default)]
pub struct InMemoryHosRepository {
    logs: Mutex<HashMap<Uuid, HosLog>>,
    violations: Mutex<HashMap<Uuid, HosViolation>>,
}

#[async_trait::async_trait]
impl HosRepository for InMemoryHosRepository {
    async fn active_log(&self, driver_id: Uuid) -> Result<Option<HosLog>, DomainError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .values()
            .find(|l| l.driver_id == driver_id && l.end_time.is_none())
            .cloned())
    }

    async fn get_log(&self, log_id: Uuid) -> Result<Option<HosLog>, DomainError> {
        Ok(self.logs.lock().unwrap().get(&log_id).cloned())
    }

    async fn append_log(&self, log: NewHosLog) -> Result<HosLog, DomainError> {
        let mut logs = self.logs.lock().unwrap();
        if logs
            .values()
            .any(|l| l.driver_id == log.driver_id && l.end_time.is_none())
        {
            return Err(DomainError::Conflict(format!(
                "Driver {} already has an open duty log",
                log.driver_id
            )));
        }
        let row = HosLog {
            log_id: Uuid::new_v4(),
            driver_id: log.driver_id,
            status: log.status,
            start_time: log.start_time,
            end_time: None,
            latitude: log.latitude,
            longitude: log.longitude,
            odometer: log.odometer,
            source: log.source,
            edit_reason: None,
            certified: false,
            created_at: Utc::now(),
        };
        logs.insert(row.log_id, row.clone());
        Ok(row)
    }

    async fn close_log(
        &self,
        log_id: Uuid,
        end_time: DateTime<Utc>,
    ) -> Result<HosLog, DomainError> {
        let mut logs = self.logs.lock().unwrap();
        let log = logs
            .get_mut(&log_id)
            .ok_or_else(|| DomainError::NotFound(format!("HOS log {} not found", log_id)))?;
        if log.end_time.is_some() {
            return Err(DomainError::Conflict(format!(
                "Duty log {} is already closed",
                log_id
            )));
        }
        log.end_time = Some(end_time);
        Ok(log.clone())
    }

    async fn update_log(&self, log: &HosLog) -> Result<HosLog, DomainError> {
        let mut logs = self.logs.lock().unwrap();
        if !logs.contains_key(&log.log_id) {
            return Err(DomainError::NotFound(format!(
                "HOS log {} not found",
                log.log_id
            )));
        }
        logs.insert(log.log_id, log.clone());
        Ok(log.clone())
    }

    async fn logs_since(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<HosLog>, DomainError> {
        let mut rows: Vec<HosLog> = self
            .logs
            .lock()
            .unwrap()
            .values()
            .filter(|l| {
                l.driver_id == driver_id
                    && l.end_time.map(|end| end > since).unwrap_or(true)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|l| l.start_time);
        Ok(rows)
    }

    async fn append_violation(
        &self,
        violation: NewHosViolation,
    ) -> Result<HosViolation, DomainError> {
        let row = HosViolation {
            violation_id: Uuid::new_v4(),
            driver_id: violation.driver_id,
            violation_type: violation.violation_type,
            severity: violation.severity,
            actual_hours: violation.actual_hours,
            limit_hours: violation.limit_hours,
            overage_hours: violation.overage_hours,
            flagged_at: Utc::now(),
            resolved: false,
            resolved_at: None,
            resolution_note: None,
        };
        self.violations
            .lock()
            .unwrap()
            .insert(row.violation_id, row.clone());
        Ok(row)
    }

    async fn get_violation(
        &self,
        violation_id: Uuid,
    ) -> Result<Option<HosViolation>, DomainError> {
        Ok(self.violations.lock().unwrap().get(&violation_id).cloned())
    }

    async fn unresolved_violations(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<HosViolation>, DomainError> {
        let mut rows: Vec<HosViolation> = self
            .violations
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.driver_id == driver_id && !v.resolved)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.flagged_at.cmp(&a.flagged_at));
        Ok(rows)
    }

    async fn resolve_violation(
        &self,
        violation_id: Uuid,
        note: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<HosViolation, DomainError> {
        let mut violations = self.violations.lock().unwrap();
        let violation = violations.get_mut(&violation_id).ok_or_else(|| {
            DomainError::NotFound(format!("Violation {} not found", violation_id))
        })?;
        if !violation.resolved {
            violation.resolved = true;
            violation.resolved_at = Some(resolved_at);
            violation.resolution_note = Some(note.to_string());
        }
        Ok(violation.clone())
    }
}

// ============================================================================
// Environment and fixtures
// ============================================================================

/// All services wired against shared in-memory fakes.
pub struct TestEnv {
    pub loads: Arc<InMemoryLoadRepository>,
    pub dispatches: Arc<InMemoryDispatchRepository>,
    pub availability: Arc<InMemoryAvailabilityRepository>,
    pub locations: Arc<InMemoryLocationRepository>,
    pub alerts: Arc<InMemoryAlertRepository>,
    pub hos_repo: Arc<InMemoryHosRepository>,
    pub gateway: Arc<TrackingGateway>,
    pub load_status: Arc<LoadStatusService>,
    pub dispatch: Arc<DispatchService>,
    pub tracking: Arc<TrackingService>,
    pub hos: Arc<HosService>,
}

impl TestEnv {
    pub fn new() -> Self {
        let loads = Arc::new(InMemoryLoadRepository::default());
        let dispatches = Arc::new(InMemoryDispatchRepository::default());
        let availability = Arc::new(InMemoryAvailabilityRepository::default());
        let locations = Arc::new(InMemoryLocationRepository::default());
        let alerts = Arc::new(InMemoryAlertRepository::default());
        let hos_repo = Arc::new(InMemoryHosRepository::default());
        let gateway = Arc::new(TrackingGateway::new());

        let load_status = Arc::new(LoadStatusService::new(
            loads.clone(),
            dispatches.clone(),
            gateway.clone(),
        ));
        let dispatch = Arc::new(DispatchService::new(
            dispatches.clone(),
            loads.clone(),
            availability.clone(),
            load_status.clone(),
            DispatchConfig::default(),
        ));
        let tracking = Arc::new(TrackingService::new(
            locations.clone(),
            availability.clone(),
            alerts.clone(),
            dispatches.clone(),
            loads.clone(),
            gateway.clone(),
            TrackingConfig::default(),
        ));
        let hos = Arc::new(HosService::new(
            hos_repo.clone(),
            availability.clone(),
            gateway.clone(),
            HosConfig::default(),
        ));

        Self {
            loads,
            dispatches,
            availability,
            locations,
            alerts,
            hos_repo,
            gateway,
            load_status,
            dispatch,
            tracking,
            hos,
        }
    }
}

/// A load in the given status, Boise pickup and Salt Lake City delivery.
pub fn load_in(status: LoadStatus) -> Load {
    let now = Utc::now();
    Load {
        load_id: Uuid::new_v4(),
        reference: "LD-1042".to_string(),
        customer_id: Uuid::new_v4(),
        carrier_id: Uuid::new_v4(),
        load_type: Some("dry_van".to_string()),
        status,
        status_before_exception: None,
        pickup: Stop {
            address: "Boise, ID".to_string(),
            latitude: PICKUP.0,
            longitude: PICKUP.1,
            window_start: None,
            window_end: None,
        },
        delivery: Stop {
            address: "Salt Lake City, UT".to_string(),
            latitude: DELIVERY.0,
            longitude: DELIVERY.1,
            window_start: None,
            window_end: None,
        },
        linehaul_rate: 1800.0,
        fuel_surcharge: 220.0,
        total_charge: 2020.0,
        driver_id: None,
        tractor_id: None,
        trailer_id: None,
        picked_up_at: None,
        delivered_at: None,
        pod_document_id: None,
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

/// An available driver with sensible defaults.
pub fn available_driver() -> DriverAvailability {
    DriverAvailability {
        driver_id: Uuid::new_v4(),
        status: AvailabilityStatus::Available,
        current_latitude: Some(PICKUP.0),
        current_longitude: Some(PICKUP.1),
        location_updated_at: Some(Utc::now()),
        hours_worked_today: 2.0,
        hours_worked_week: 20.0,
        assigned_tractor_id: None,
        assigned_trailer_id: None,
        on_time_delivery_rate: 95.0,
        acceptance_rate: 90.0,
        completed_loads: 120,
        updated_at: Utc::now(),
    }
}
