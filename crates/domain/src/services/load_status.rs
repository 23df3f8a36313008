//! Load status state machine service.
//!
//! Transitions are serialized per load: history rows reflect the order
//! changes were applied, not the order requests arrived. On top of the lock,
//! the optimistic version check in the repository turns an interleaving
//! writer into a `Conflict`.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::models::{
    ChangeStatusRequest, DispatchStatus, Load, LoadStatus, LoadStatusHistory,
    ValidTransitionsResponse,
};
use crate::repositories::{DispatchRepository, LoadRepository, NewStatusHistory};
use crate::services::gateway::{LoadStatusChangedEvent, PushEvent, Topic, TrackingGateway};
use crate::services::locks::KeyedLocks;

pub struct LoadStatusService {
    loads: Arc<dyn LoadRepository>,
    dispatches: Arc<dyn DispatchRepository>,
    gateway: Arc<TrackingGateway>,
    locks: KeyedLocks,
}

impl LoadStatusService {
    pub fn new(
        loads: Arc<dyn LoadRepository>,
        dispatches: Arc<dyn DispatchRepository>,
        gateway: Arc<TrackingGateway>,
    ) -> Self {
        Self {
            loads,
            dispatches,
            gateway,
            locks: KeyedLocks::new(),
        }
    }

    /// Applies a status transition, appending exactly one history row.
    pub async fn change_status(
        &self,
        load_id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<(Load, LoadStatusHistory), DomainError> {
        request.validate()?;

        let _guard = self.locks.acquire(load_id).await;

        let mut load = self
            .loads
            .get(load_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Load {} not found", load_id)))?;

        let previous = load.status;
        let target = request.new_status;

        if !previous.can_transition_to(target, load.status_before_exception) {
            return Err(DomainError::InvalidTransition(format!(
                "{} -> {}",
                previous, target
            )));
        }

        let now = Utc::now();

        // Recovery bookkeeping: entering a suspendable exception records the
        // prior status, leaving the exception clears it.
        match target {
            LoadStatus::OnHold | LoadStatus::Problem => {
                if !previous.is_exception() {
                    load.status_before_exception = Some(previous);
                }
            }
            _ => load.status_before_exception = None,
        }

        match target {
            LoadStatus::PickedUp if load.picked_up_at.is_none() => {
                load.picked_up_at = Some(now);
            }
            LoadStatus::Delivered if load.delivered_at.is_none() => {
                load.delivered_at = Some(now);
            }
            _ => {}
        }

        load.status = target;
        load.updated_at = now;

        let updated = self.loads.update(&load).await?;

        let history = self
            .loads
            .append_history(NewStatusHistory {
                load_id,
                previous_status: previous,
                new_status: target,
                changed_at: now,
                changed_by: request.changed_by.clone(),
                automatic: request.automatic,
                latitude: request.latitude,
                longitude: request.longitude,
                reason: request.reason.clone(),
            })
            .await?;

        if target.is_terminal() {
            self.finalize_dispatch(&updated, target).await?;
        }

        tracing::info!(
            load_id = %load_id,
            from = %previous,
            to = %target,
            changed_by = %request.changed_by,
            automatic = request.automatic,
            "load status changed"
        );

        self.publish_change(&updated, &history);

        Ok((updated, history))
    }

    /// Pure query; agrees exactly with what `change_status` would accept.
    pub async fn valid_transitions(
        &self,
        load_id: Uuid,
    ) -> Result<ValidTransitionsResponse, DomainError> {
        let load = self
            .loads
            .get(load_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Load {} not found", load_id)))?;

        Ok(ValidTransitionsResponse {
            load_id,
            current_status: load.status,
            valid_transitions: load.status.allowed_next(load.status_before_exception),
        })
    }

    /// Full audit trail, oldest first.
    pub async fn history(&self, load_id: Uuid) -> Result<Vec<LoadStatusHistory>, DomainError> {
        if self.loads.get(load_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Load {} not found", load_id)));
        }
        self.loads.history(load_id).await
    }

    pub async fn get(&self, load_id: Uuid) -> Result<Load, DomainError> {
        self.loads
            .get(load_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Load {} not found", load_id)))
    }

    /// A terminal load drags its active dispatch along: Completed completes
    /// it, Cancelled cancels it. A dispatch not yet in progress can only be
    /// cancelled.
    async fn finalize_dispatch(
        &self,
        load: &Load,
        target: LoadStatus,
    ) -> Result<(), DomainError> {
        let Some(mut dispatch) = self.dispatches.get_active_by_load(load.load_id).await? else {
            return Ok(());
        };

        let final_status = match target {
            LoadStatus::Completed if dispatch.status.can_transition_to(DispatchStatus::Completed) => {
                DispatchStatus::Completed
            }
            _ => DispatchStatus::Cancelled,
        };

        if !dispatch.status.can_transition_to(final_status) {
            return Ok(());
        }

        dispatch.status = final_status;
        dispatch.updated_at = Utc::now();
        self.dispatches.update(&dispatch).await?;

        tracing::info!(
            dispatch_id = %dispatch.dispatch_id,
            load_id = %load.load_id,
            status = %final_status,
            "dispatch finalized with load"
        );
        Ok(())
    }

    fn publish_change(&self, load: &Load, history: &LoadStatusHistory) {
        let event = LoadStatusChangedEvent {
            load_id: load.load_id,
            previous_status: history.previous_status,
            new_status: history.new_status,
            changed_at: history.changed_at,
            changed_by: history.changed_by.clone(),
            automatic: history.automatic,
        };

        self.gateway
            .publish(Topic::Global, &PushEvent::LoadStatusChanged(event.clone()));
        if let Some(driver_id) = load.driver_id {
            self.gateway
                .publish(Topic::Driver(driver_id), &PushEvent::LoadStatusChanged(event.clone()));
        }

        if history.new_status == LoadStatus::PodReceived {
            if let Some(pod_id) = load.pod_document_id {
                self.gateway
                    .publish(Topic::Pod(pod_id), &PushEvent::PodReceived(event.clone()));
            }
            self.gateway.publish(Topic::Global, &PushEvent::PodReceived(event));
        }
    }
}
