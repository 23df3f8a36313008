//! Location ingestion and geofence pipeline.
//!
//! Every ping is stored as an immutable row; the derived state (driver's
//! current location, geofence membership) is serialized per driver. Alerts
//! are edge-triggered: the pipeline retains the last known in/out state per
//! (dispatch, zone) and only emits on a membership change, so repeated pings
//! on the same side of the boundary never storm the alert table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{TimeZone, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;
use validator::Validate;

use crate::config::TrackingConfig;
use crate::error::DomainError;
use crate::models::{
    AcknowledgeAlertRequest, ActiveTrackersResponse, DriverLocation, DriverLocationResponse,
    GeofenceAlert, GeofenceAlertResponse, GeofenceAlertType, IngestLocationRequest, Load,
    LocationHistoryQuery, LocationHistoryResponse, PendingAlertsResponse, ZoneKind,
};
use crate::repositories::{
    DispatchRepository, DriverAvailabilityRepository, GeofenceAlertRepository, LoadRepository,
    LocationRepository, NewGeofenceAlert, NewLocation,
};
use crate::services::gateway::{PushEvent, Topic, TrackingGateway};
use crate::services::locks::KeyedLocks;

pub struct TrackingService {
    locations: Arc<dyn LocationRepository>,
    availability: Arc<dyn DriverAvailabilityRepository>,
    alerts: Arc<dyn GeofenceAlertRepository>,
    dispatches: Arc<dyn DispatchRepository>,
    loads: Arc<dyn LoadRepository>,
    gateway: Arc<TrackingGateway>,
    config: TrackingConfig,
    locks: KeyedLocks,
    /// Last known geofence membership per (dispatch, zone).
    memberships: Mutex<HashMap<(Uuid, ZoneKind), bool>>,
}

impl TrackingService {
    pub fn new(
        locations: Arc<dyn LocationRepository>,
        availability: Arc<dyn DriverAvailabilityRepository>,
        alerts: Arc<dyn GeofenceAlertRepository>,
        dispatches: Arc<dyn DispatchRepository>,
        loads: Arc<dyn LoadRepository>,
        gateway: Arc<TrackingGateway>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            locations,
            availability,
            alerts,
            dispatches,
            loads,
            gateway,
            config,
            locks: KeyedLocks::new(),
            memberships: Mutex::new(HashMap::new()),
        }
    }

    /// Ingests one GPS ping: persists it, moves the driver's live position,
    /// and evaluates geofence edges when a dispatch is attached.
    pub async fn ingest(
        &self,
        request: IngestLocationRequest,
    ) -> Result<DriverLocation, DomainError> {
        request.validate()?;

        let recorded_at = Utc
            .timestamp_millis_opt(request.timestamp)
            .single()
            .ok_or_else(|| DomainError::Validation("Invalid timestamp".to_string()))?;

        let _guard = self.locks.acquire(request.driver_id).await;

        let mut availability = self
            .availability
            .get(request.driver_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(format!("Driver {} not found", request.driver_id))
            })?;

        // Resolve the dispatch context up front so a bad reference fails the
        // whole call with nothing persisted.
        let geofence_context = match request.dispatch_id {
            Some(dispatch_id) => {
                let dispatch = self.dispatches.get(dispatch_id).await?.ok_or_else(|| {
                    DomainError::NotFound(format!("Dispatch {} not found", dispatch_id))
                })?;
                if dispatch.status.is_terminal() {
                    // Stragglers after completion still get stored, but the
                    // zones of a finished dispatch are no longer watched.
                    self.forget_dispatch(dispatch.dispatch_id);
                    None
                } else {
                    let load = self.loads.get(dispatch.load_id).await?.ok_or_else(|| {
                        DomainError::NotFound(format!("Load {} not found", dispatch.load_id))
                    })?;
                    Some((dispatch.dispatch_id, load))
                }
            }
            None => None,
        };

        let stored = self
            .locations
            .append(NewLocation {
                driver_id: request.driver_id,
                latitude: request.latitude,
                longitude: request.longitude,
                accuracy: request.accuracy,
                speed: request.speed,
                heading: request.heading,
                dispatch_id: request.dispatch_id,
                recorded_at,
                source: request.source.clone(),
            })
            .await?;

        availability.current_latitude = Some(request.latitude);
        availability.current_longitude = Some(request.longitude);
        availability.location_updated_at = Some(recorded_at);
        availability.updated_at = Utc::now();
        self.availability.update(&availability).await?;

        let location_event = PushEvent::LocationUpdated(DriverLocationResponse::from(stored.clone()));
        self.gateway.publish(Topic::Driver(request.driver_id), &location_event);
        self.gateway.publish(Topic::AllTrackers, &location_event);

        if let Some((dispatch_id, load)) = geofence_context {
            self.evaluate_geofences(dispatch_id, &load, &stored).await?;
        }

        Ok(stored)
    }

    pub async fn latest(&self, driver_id: Uuid) -> Result<DriverLocation, DomainError> {
        self.locations
            .latest_by_driver(driver_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("No location for driver {}", driver_id)))
    }

    pub async fn history(
        &self,
        driver_id: Uuid,
        query: &LocationHistoryQuery,
    ) -> Result<LocationHistoryResponse, DomainError> {
        let since_minutes = query.effective_since_minutes();
        let since = Utc::now() - chrono::Duration::minutes(since_minutes);
        let locations = self.locations.history(driver_id, since).await?;
        Ok(LocationHistoryResponse {
            driver_id,
            since_minutes,
            locations: locations.into_iter().map(DriverLocationResponse::from).collect(),
        })
    }

    pub async fn active_trackers(&self) -> Result<ActiveTrackersResponse, DomainError> {
        let trackers = self.locations.active_trackers().await?;
        let trackers: Vec<DriverLocationResponse> =
            trackers.into_iter().map(DriverLocationResponse::from).collect();
        let total = trackers.len();
        Ok(ActiveTrackersResponse { trackers, total })
    }

    /// Marks an alert acknowledged. Idempotent.
    pub async fn acknowledge_alert(
        &self,
        alert_id: Uuid,
        request: AcknowledgeAlertRequest,
    ) -> Result<GeofenceAlert, DomainError> {
        request.validate()?;

        let alert = self
            .alerts
            .get(alert_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Alert {} not found", alert_id)))?;
        if alert.acknowledged {
            return Ok(alert);
        }

        let acknowledged = self
            .alerts
            .acknowledge(alert_id, &request.acknowledged_by, Utc::now())
            .await?;

        self.gateway.publish(
            Topic::Global,
            &PushEvent::AlertAcknowledged(GeofenceAlertResponse::from(acknowledged.clone())),
        );

        Ok(acknowledged)
    }

    pub async fn pending_alerts(&self) -> Result<PendingAlertsResponse, DomainError> {
        let alerts = self.alerts.pending().await?;
        let alerts: Vec<GeofenceAlertResponse> =
            alerts.into_iter().map(GeofenceAlertResponse::from).collect();
        let total = alerts.len();
        Ok(PendingAlertsResponse { alerts, total })
    }

    /// Subscribes to a driver's live feed. Late joiners get the latest known
    /// position pushed first so the dashboard has a snapshot before the next
    /// ping arrives.
    pub async fn subscribe_driver(
        &self,
        subscriber_id: &str,
        driver_id: Uuid,
    ) -> Result<mpsc::UnboundedReceiver<PushEvent>, DomainError> {
        let rx = self.gateway.subscribe(subscriber_id, Topic::Driver(driver_id));

        if let Some(latest) = self.locations.latest_by_driver(driver_id).await? {
            self.gateway.send_to(
                subscriber_id,
                Topic::Driver(driver_id),
                &PushEvent::LocationUpdated(DriverLocationResponse::from(latest)),
            );
        }

        Ok(rx)
    }

    /// Evaluates both zones of the dispatch's load against the ping, emitting
    /// at most one alert per zone per call.
    async fn evaluate_geofences(
        &self,
        dispatch_id: Uuid,
        load: &Load,
        ping: &DriverLocation,
    ) -> Result<(), DomainError> {
        let zones = [
            (ZoneKind::Pickup, &load.pickup),
            (ZoneKind::Delivery, &load.delivery),
        ];

        for (zone, stop) in zones {
            let inside = shared::geo::within_radius(
                ping.latitude,
                ping.longitude,
                stop.latitude,
                stop.longitude,
                self.config.geofence_radius_miles,
            );

            let previous = {
                let memberships =
                    self.memberships.lock().unwrap_or_else(PoisonError::into_inner);
                memberships.get(&(dispatch_id, zone)).copied()
            };

            // First observation only counts as an edge if the driver is
            // already inside the zone.
            let edge = match previous {
                Some(was_inside) => was_inside != inside,
                None => inside,
            };
            if !edge {
                self.remember_membership(dispatch_id, zone, inside);
                continue;
            }

            // Membership commits only once the alert row exists; a failed
            // append leaves the edge detectable when the caller retries.
            let alert = self
                .alerts
                .append(NewGeofenceAlert {
                    alert_type: GeofenceAlertType::for_edge(zone, inside),
                    driver_id: ping.driver_id,
                    dispatch_id,
                    location_id: ping.id,
                })
                .await?;
            self.remember_membership(dispatch_id, zone, inside);

            tracing::info!(
                alert_id = %alert.alert_id,
                alert_type = %alert.alert_type,
                driver_id = %ping.driver_id,
                dispatch_id = %dispatch_id,
                "geofence edge detected"
            );

            let response = GeofenceAlertResponse::from(alert);
            let event = if inside {
                PushEvent::ZoneEntered(response)
            } else {
                PushEvent::ZoneExited(response)
            };
            self.gateway.publish(Topic::Driver(ping.driver_id), &event);
            self.gateway.publish(Topic::Global, &event);
        }

        Ok(())
    }

    fn remember_membership(&self, dispatch_id: Uuid, zone: ZoneKind, inside: bool) {
        let mut memberships = self.memberships.lock().unwrap_or_else(PoisonError::into_inner);
        memberships.insert((dispatch_id, zone), inside);
    }

    /// Drops retained zone membership for a finished dispatch.
    pub fn forget_dispatch(&self, dispatch_id: Uuid) {
        let mut memberships = self.memberships.lock().unwrap_or_else(PoisonError::into_inner);
        memberships.retain(|(id, _), _| *id != dispatch_id);
    }
}
