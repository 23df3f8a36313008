//! Dispatch assignment engine.
//!
//! Creates and advances dispatches, enforcing the one-active-dispatch-per-load
//! rule and driver availability, and scoring candidates for auto-match.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::config::DispatchConfig;
use crate::error::DomainError;
use crate::models::{
    AcceptDispatchRequest, AssignDispatchRequest, AutoMatchRequest, AvailabilityStatus,
    ChangeStatusRequest, Dispatch, DispatchMethod, DispatchScores, DispatchStatus,
    DriverAvailability, Load, LoadStatus, RejectDispatchRequest, DAILY_DRIVING_CAP_HOURS,
    WEEKLY_ON_DUTY_CAP_HOURS,
};
use crate::repositories::{DispatchRepository, DriverAvailabilityRepository, LoadRepository};
use crate::services::load_status::LoadStatusService;
use crate::services::locks::KeyedLocks;

pub struct DispatchService {
    dispatches: Arc<dyn DispatchRepository>,
    loads: Arc<dyn LoadRepository>,
    availability: Arc<dyn DriverAvailabilityRepository>,
    load_status: Arc<LoadStatusService>,
    config: DispatchConfig,
    locks: KeyedLocks,
}

impl DispatchService {
    pub fn new(
        dispatches: Arc<dyn DispatchRepository>,
        loads: Arc<dyn LoadRepository>,
        availability: Arc<dyn DriverAvailabilityRepository>,
        load_status: Arc<LoadStatusService>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            dispatches,
            loads,
            availability,
            load_status,
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn get(&self, dispatch_id: Uuid) -> Result<Dispatch, DomainError> {
        self.dispatches
            .get(dispatch_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Dispatch {} not found", dispatch_id)))
    }

    /// Assigns a load to a driver, creating a Pending dispatch.
    pub async fn assign(&self, request: AssignDispatchRequest) -> Result<Dispatch, DomainError> {
        request.validate()?;
        self.assign_inner(request, None).await
    }

    /// Scores every available driver against the load and assigns the best.
    pub async fn auto_match(&self, request: AutoMatchRequest) -> Result<Dispatch, DomainError> {
        request.validate()?;

        let load = self
            .loads
            .get(request.load_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Load {} not found", request.load_id)))?;

        if self.dispatches.get_active_by_load(load.load_id).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Load {} already has an active dispatch",
                load.load_id
            )));
        }

        let candidates = self.availability.list_available().await?;

        let mut best: Option<(DriverAvailability, DispatchScores, f64)> = None;
        for candidate in candidates {
            let (scores, distance) = self.score(&candidate, &load);
            let better = match &best {
                None => true,
                Some((_, best_scores, best_distance)) => {
                    scores.total_score > best_scores.total_score + 1e-9
                        || ((scores.total_score - best_scores.total_score).abs() <= 1e-9
                            && distance < *best_distance)
                }
            };
            if better {
                best = Some((candidate, scores, distance));
            }
        }

        let (driver, scores, distance) = best.ok_or_else(|| {
            DomainError::DriverUnavailable("No available drivers to match".to_string())
        })?;

        tracing::info!(
            load_id = %load.load_id,
            driver_id = %driver.driver_id,
            total_score = scores.total_score,
            distance_miles = distance,
            "auto-match selected driver"
        );

        self.assign_inner(
            AssignDispatchRequest {
                load_id: load.load_id,
                driver_id: driver.driver_id,
                tractor_id: driver.assigned_tractor_id,
                trailer_id: driver.assigned_trailer_id,
                method: DispatchMethod::AutoMatched,
                assigned_by: request.requested_by,
            },
            Some(scores),
        )
        .await
    }

    /// Driver accepts: Pending -> Accepted, load advances to Dispatched.
    pub async fn accept(
        &self,
        dispatch_id: Uuid,
        request: AcceptDispatchRequest,
    ) -> Result<Dispatch, DomainError> {
        request.validate()?;

        let mut dispatch = self.get(dispatch_id).await?;
        if !dispatch.status.can_transition_to(DispatchStatus::Accepted) {
            return Err(DomainError::InvalidTransition(format!(
                "{} -> {}",
                dispatch.status,
                DispatchStatus::Accepted
            )));
        }

        // The load moves first; a rejected transition (held or cancelled
        // load) leaves the dispatch Pending.
        self.load_status
            .change_status(
                dispatch.load_id,
                automatic_change(LoadStatus::Dispatched, &request.actor, None),
            )
            .await?;

        let now = Utc::now();
        dispatch.status = DispatchStatus::Accepted;
        dispatch.accepted_at = Some(now);
        dispatch.updated_at = now;
        let updated = self.dispatches.update(&dispatch).await?;

        if let Some(mut availability) = self.availability.get(dispatch.driver_id).await? {
            availability.status = AvailabilityStatus::OnDuty;
            availability.updated_at = now;
            self.availability.update(&availability).await?;
        }

        Ok(updated)
    }

    /// Driver rejects: Pending -> Rejected. A reason is mandatory. The load
    /// keeps its Assigned status so it can be reassigned.
    pub async fn reject(
        &self,
        dispatch_id: Uuid,
        request: RejectDispatchRequest,
    ) -> Result<Dispatch, DomainError> {
        request.validate()?;

        let mut dispatch = self.get(dispatch_id).await?;
        if !dispatch.status.can_transition_to(DispatchStatus::Rejected) {
            return Err(DomainError::InvalidTransition(format!(
                "{} -> {}",
                dispatch.status,
                DispatchStatus::Rejected
            )));
        }

        let now = Utc::now();
        dispatch.status = DispatchStatus::Rejected;
        dispatch.rejected_at = Some(now);
        dispatch.rejection_reason = Some(request.reason);
        dispatch.updated_at = now;
        self.dispatches.update(&dispatch).await
    }

    /// Accepted -> InProgress, when the driver starts rolling.
    pub async fn begin(&self, dispatch_id: Uuid) -> Result<Dispatch, DomainError> {
        let mut dispatch = self.get(dispatch_id).await?;
        if !dispatch.status.can_transition_to(DispatchStatus::InProgress) {
            return Err(DomainError::InvalidTransition(format!(
                "{} -> {}",
                dispatch.status,
                DispatchStatus::InProgress
            )));
        }

        dispatch.status = DispatchStatus::InProgress;
        dispatch.updated_at = Utc::now();
        self.dispatches.update(&dispatch).await
    }

    /// InProgress -> Completed, only once the load has actually delivered.
    pub async fn complete(&self, dispatch_id: Uuid) -> Result<Dispatch, DomainError> {
        let mut dispatch = self.get(dispatch_id).await?;
        if !dispatch.status.can_transition_to(DispatchStatus::Completed) {
            return Err(DomainError::InvalidTransition(format!(
                "{} -> {}",
                dispatch.status,
                DispatchStatus::Completed
            )));
        }

        let load = self
            .loads
            .get(dispatch.load_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Load {} not found", dispatch.load_id)))?;
        if !load.status.is_delivered_or_later() {
            return Err(DomainError::PrematureCompletion(format!(
                "Load {} is {} and has not delivered",
                load.load_id, load.status
            )));
        }

        let now = Utc::now();
        dispatch.status = DispatchStatus::Completed;
        dispatch.updated_at = now;
        let updated = self.dispatches.update(&dispatch).await?;

        if let Some(mut availability) = self.availability.get(dispatch.driver_id).await? {
            availability.status = AvailabilityStatus::Available;
            availability.completed_loads += 1;
            availability.updated_at = now;
            self.availability.update(&availability).await?;
        }

        Ok(updated)
    }

    /// Cancels from any non-terminal state.
    pub async fn cancel(&self, dispatch_id: Uuid) -> Result<Dispatch, DomainError> {
        let mut dispatch = self.get(dispatch_id).await?;
        if !dispatch.status.can_transition_to(DispatchStatus::Cancelled) {
            return Err(DomainError::InvalidTransition(format!(
                "{} -> {}",
                dispatch.status,
                DispatchStatus::Cancelled
            )));
        }

        dispatch.status = DispatchStatus::Cancelled;
        dispatch.updated_at = Utc::now();
        self.dispatches.update(&dispatch).await
    }

    async fn assign_inner(
        &self,
        request: AssignDispatchRequest,
        scores: Option<DispatchScores>,
    ) -> Result<Dispatch, DomainError> {
        let _guard = self.locks.acquire(request.load_id).await;

        let mut load = self
            .loads
            .get(request.load_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Load {} not found", request.load_id)))?;

        if self.dispatches.get_active_by_load(load.load_id).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Load {} already has an active dispatch",
                load.load_id
            )));
        }

        let availability = self
            .availability
            .get(request.driver_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(format!("Driver {} not found", request.driver_id))
            })?;

        // DriverRequested assignments may override the availability gate.
        if availability.status != AvailabilityStatus::Available
            && request.method != DispatchMethod::DriverRequested
        {
            return Err(DomainError::DriverUnavailable(format!(
                "Driver {} is {}",
                request.driver_id, availability.status
            )));
        }

        // A reassigned load is already in Assigned; anything else must have a
        // valid edge there before we create the dispatch.
        if load.status != LoadStatus::Assigned
            && !load
                .status
                .can_transition_to(LoadStatus::Assigned, load.status_before_exception)
        {
            return Err(DomainError::InvalidTransition(format!(
                "{} -> {}",
                load.status,
                LoadStatus::Assigned
            )));
        }

        let now = Utc::now();
        let dispatch = Dispatch {
            dispatch_id: Uuid::new_v4(),
            load_id: request.load_id,
            driver_id: request.driver_id,
            tractor_id: request.tractor_id,
            trailer_id: request.trailer_id,
            status: DispatchStatus::Pending,
            method: request.method,
            assigned_at: now,
            assigned_by: request.assigned_by.clone(),
            accepted_at: None,
            rejected_at: None,
            rejection_reason: None,
            scores,
            created_at: now,
            updated_at: now,
        };
        let created = self.dispatches.create(&dispatch).await?;

        load.driver_id = Some(request.driver_id);
        load.tractor_id = request.tractor_id;
        load.trailer_id = request.trailer_id;
        load.updated_at = now;
        self.loads.update(&load).await?;

        if load.status != LoadStatus::Assigned {
            self.load_status
                .change_status(
                    load.load_id,
                    automatic_change(
                        LoadStatus::Assigned,
                        &request.assigned_by,
                        Some(format!("Dispatch {} created", created.dispatch_id)),
                    ),
                )
                .await?;
        }

        tracing::info!(
            dispatch_id = %created.dispatch_id,
            load_id = %created.load_id,
            driver_id = %created.driver_id,
            method = ?created.method,
            "dispatch created"
        );

        Ok(created)
    }

    fn score(&self, driver: &DriverAvailability, load: &Load) -> (DispatchScores, f64) {
        let distance = match (driver.current_latitude, driver.current_longitude) {
            (Some(lat), Some(lon)) => shared::geo::distance_miles(
                lat,
                lon,
                load.pickup.latitude,
                load.pickup.longitude,
            ),
            _ => f64::INFINITY,
        };

        let proximity_score = if distance.is_finite() {
            100.0 / (1.0 + distance)
        } else {
            0.0
        };

        let today_fraction = driver.hours_available_today() / DAILY_DRIVING_CAP_HOURS;
        let week_fraction = driver.hours_available_week() / WEEKLY_ON_DUTY_CAP_HOURS;
        let availability_score = 100.0 * (0.5 * today_fraction + 0.5 * week_fraction);

        let performance_score =
            0.6 * driver.on_time_delivery_rate + 0.4 * driver.acceptance_rate;

        let total_score = self.config.proximity_weight * proximity_score
            + self.config.availability_weight * availability_score
            + self.config.performance_weight * performance_score;

        (
            DispatchScores {
                proximity_score,
                availability_score,
                performance_score,
                total_score,
            },
            distance,
        )
    }
}

fn automatic_change(
    new_status: LoadStatus,
    changed_by: &str,
    reason: Option<String>,
) -> ChangeStatusRequest {
    ChangeStatusRequest {
        new_status,
        changed_by: changed_by.to_string(),
        automatic: true,
        reason,
        latitude: None,
        longitude: None,
    }
}
