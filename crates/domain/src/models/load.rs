//! Load domain model and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Load Status State Machine
// ============================================================================

/// Lifecycle phase a load status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadPhase {
    Planning,
    Assignment,
    Pickup,
    Transit,
    Delivery,
    Settlement,
    Exception,
}

/// Status of a load in its lifecycle.
///
/// Values are ordered by normal progression, but transitions are not strictly
/// monotonic: the exception statuses (`OnHold`, `Cancelled`, `Problem`) are
/// reachable from every non-terminal status, and `OnHold`/`Problem` can
/// recover back to the status held before the exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    Draft,
    Pending,
    Booked,
    AwaitingAssignment,
    Assigned,
    Dispatched,
    DriverEnRoute,
    AtPickup,
    Loading,
    PickedUp,
    InTransit,
    AtStop,
    Delayed,
    AtDelivery,
    Unloading,
    Delivered,
    PendingPod,
    PodReceived,
    Invoiced,
    Completed,
    OnHold,
    Cancelled,
    Problem,
}

impl LoadStatus {
    /// All statuses in progression order.
    pub const ALL: [LoadStatus; 23] = [
        LoadStatus::Draft,
        LoadStatus::Pending,
        LoadStatus::Booked,
        LoadStatus::AwaitingAssignment,
        LoadStatus::Assigned,
        LoadStatus::Dispatched,
        LoadStatus::DriverEnRoute,
        LoadStatus::AtPickup,
        LoadStatus::Loading,
        LoadStatus::PickedUp,
        LoadStatus::InTransit,
        LoadStatus::AtStop,
        LoadStatus::Delayed,
        LoadStatus::AtDelivery,
        LoadStatus::Unloading,
        LoadStatus::Delivered,
        LoadStatus::PendingPod,
        LoadStatus::PodReceived,
        LoadStatus::Invoiced,
        LoadStatus::Completed,
        LoadStatus::OnHold,
        LoadStatus::Cancelled,
        LoadStatus::Problem,
    ];

    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Draft => "DRAFT",
            LoadStatus::Pending => "PENDING",
            LoadStatus::Booked => "BOOKED",
            LoadStatus::AwaitingAssignment => "AWAITING_ASSIGNMENT",
            LoadStatus::Assigned => "ASSIGNED",
            LoadStatus::Dispatched => "DISPATCHED",
            LoadStatus::DriverEnRoute => "DRIVER_EN_ROUTE",
            LoadStatus::AtPickup => "AT_PICKUP",
            LoadStatus::Loading => "LOADING",
            LoadStatus::PickedUp => "PICKED_UP",
            LoadStatus::InTransit => "IN_TRANSIT",
            LoadStatus::AtStop => "AT_STOP",
            LoadStatus::Delayed => "DELAYED",
            LoadStatus::AtDelivery => "AT_DELIVERY",
            LoadStatus::Unloading => "UNLOADING",
            LoadStatus::Delivered => "DELIVERED",
            LoadStatus::PendingPod => "PENDING_POD",
            LoadStatus::PodReceived => "POD_RECEIVED",
            LoadStatus::Invoiced => "INVOICED",
            LoadStatus::Completed => "COMPLETED",
            LoadStatus::OnHold => "ON_HOLD",
            LoadStatus::Cancelled => "CANCELLED",
            LoadStatus::Problem => "PROBLEM",
        }
    }

    /// Phase grouping used by dashboards and the dispatch engine.
    pub fn phase(&self) -> LoadPhase {
        match self {
            LoadStatus::Draft | LoadStatus::Pending | LoadStatus::Booked => LoadPhase::Planning,
            LoadStatus::AwaitingAssignment
            | LoadStatus::Assigned
            | LoadStatus::Dispatched
            | LoadStatus::DriverEnRoute => LoadPhase::Assignment,
            LoadStatus::AtPickup | LoadStatus::Loading | LoadStatus::PickedUp => LoadPhase::Pickup,
            LoadStatus::InTransit | LoadStatus::AtStop | LoadStatus::Delayed => LoadPhase::Transit,
            LoadStatus::AtDelivery | LoadStatus::Unloading | LoadStatus::Delivered => {
                LoadPhase::Delivery
            }
            LoadStatus::PendingPod
            | LoadStatus::PodReceived
            | LoadStatus::Invoiced
            | LoadStatus::Completed => LoadPhase::Settlement,
            LoadStatus::OnHold | LoadStatus::Cancelled | LoadStatus::Problem => LoadPhase::Exception,
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadStatus::Completed | LoadStatus::Cancelled)
    }

    /// Exception statuses are reachable from any non-terminal status.
    pub fn is_exception(&self) -> bool {
        matches!(self, LoadStatus::OnHold | LoadStatus::Cancelled | LoadStatus::Problem)
    }

    /// Whether the load has reached a delivered/settlement state that permits
    /// dispatch completion.
    pub fn is_delivered_or_later(&self) -> bool {
        matches!(
            self,
            LoadStatus::Delivered
                | LoadStatus::PendingPod
                | LoadStatus::PodReceived
                | LoadStatus::Invoiced
                | LoadStatus::Completed
        )
    }

    /// Forward progression edges within and across phases.
    fn progression(&self) -> &'static [LoadStatus] {
        match self {
            LoadStatus::Draft => &[LoadStatus::Pending],
            LoadStatus::Pending => &[LoadStatus::Booked],
            LoadStatus::Booked => &[LoadStatus::AwaitingAssignment],
            LoadStatus::AwaitingAssignment => &[LoadStatus::Assigned],
            LoadStatus::Assigned => &[LoadStatus::Dispatched],
            LoadStatus::Dispatched => &[LoadStatus::DriverEnRoute],
            LoadStatus::DriverEnRoute => &[LoadStatus::AtPickup],
            LoadStatus::AtPickup => &[LoadStatus::Loading],
            LoadStatus::Loading => &[LoadStatus::PickedUp],
            LoadStatus::PickedUp => &[LoadStatus::InTransit],
            // The transit loop: stops and delays return to in-transit.
            LoadStatus::InTransit => {
                &[LoadStatus::AtStop, LoadStatus::Delayed, LoadStatus::AtDelivery]
            }
            LoadStatus::AtStop => &[LoadStatus::InTransit, LoadStatus::Delayed],
            LoadStatus::Delayed => &[LoadStatus::InTransit, LoadStatus::AtDelivery],
            LoadStatus::AtDelivery => &[LoadStatus::Unloading],
            LoadStatus::Unloading => &[LoadStatus::Delivered],
            LoadStatus::Delivered => &[LoadStatus::PendingPod],
            LoadStatus::PendingPod => &[LoadStatus::PodReceived],
            LoadStatus::PodReceived => &[LoadStatus::Invoiced],
            LoadStatus::Invoiced => &[LoadStatus::Completed],
            LoadStatus::Completed
            | LoadStatus::Cancelled
            | LoadStatus::OnHold
            | LoadStatus::Problem => &[],
        }
    }

    /// The full allowed-next set from this status.
    ///
    /// `status_before_exception` is the status the load held before entering
    /// `OnHold`/`Problem`; it supplies the recovery edge.
    pub fn allowed_next(&self, status_before_exception: Option<LoadStatus>) -> Vec<LoadStatus> {
        if self.is_terminal() {
            return Vec::new();
        }

        let mut next: Vec<LoadStatus> = match self {
            LoadStatus::OnHold | LoadStatus::Problem => {
                let mut recovery = Vec::new();
                if let Some(prior) = status_before_exception {
                    if !prior.is_exception() {
                        recovery.push(prior);
                    }
                }
                recovery
            }
            _ => self.progression().to_vec(),
        };

        for exception in [LoadStatus::OnHold, LoadStatus::Cancelled, LoadStatus::Problem] {
            if exception != *self && !next.contains(&exception) {
                next.push(exception);
            }
        }
        next
    }

    /// Check whether a transition to `target` is valid.
    pub fn can_transition_to(
        &self,
        target: LoadStatus,
        status_before_exception: Option<LoadStatus>,
    ) -> bool {
        self.allowed_next(status_before_exception).contains(&target)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoadStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid load status: {}", s))
    }
}

// ============================================================================
// Core Models
// ============================================================================

/// A pickup or delivery stop on a load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateTime<Utc>>,
}

/// Represents a shipment movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    pub load_id: Uuid,
    pub reference: String,
    pub customer_id: Uuid,
    pub carrier_id: Uuid,
    pub load_type: Option<String>,
    pub status: LoadStatus,
    /// Status held before entering OnHold/Problem; supplies the recovery edge.
    pub status_before_exception: Option<LoadStatus>,
    pub pickup: Stop,
    pub delivery: Stop,
    pub linehaul_rate: f64,
    pub fuel_surcharge: f64,
    pub total_charge: f64,
    pub driver_id: Option<Uuid>,
    pub tractor_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub pod_document_id: Option<Uuid>,
    /// Optimistic concurrency token, bumped on every update.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record for a single status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatusHistory {
    pub id: i64,
    pub load_id: Uuid,
    pub previous_status: LoadStatus,
    pub new_status: LoadStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    /// True when the change was applied by the system rather than a user.
    pub automatic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Request payload for a status change.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub new_status: LoadStatus,

    #[validate(length(min = 1, max = 100, message = "changedBy must be 1-100 characters"))]
    pub changed_by: String,

    #[serde(default)]
    pub automatic: bool,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,

    #[validate(custom(function = "crate::models::validate_optional_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "crate::models::validate_optional_longitude"))]
    pub longitude: Option<f64>,
}

/// Response payload for load reads and status changes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub load_id: Uuid,
    pub reference: String,
    pub status: LoadStatus,
    pub phase: LoadPhase,
    pub pickup: Stop,
    pub delivery: Stop,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tractor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub total_charge: f64,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<Load> for LoadResponse {
    fn from(load: Load) -> Self {
        Self {
            load_id: load.load_id,
            reference: load.reference,
            status: load.status,
            phase: load.status.phase(),
            pickup: load.pickup,
            delivery: load.delivery,
            driver_id: load.driver_id,
            tractor_id: load.tractor_id,
            trailer_id: load.trailer_id,
            picked_up_at: load.picked_up_at,
            delivered_at: load.delivered_at,
            total_charge: load.total_charge,
            version: load.version,
            updated_at: load.updated_at,
        }
    }
}

/// Response for the valid-transitions query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidTransitionsResponse {
    pub load_id: Uuid,
    pub current_status: LoadStatus,
    pub valid_transitions: Vec<LoadStatus>,
}

/// A single status-history entry on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryResponse {
    pub previous_status: LoadStatus,
    pub new_status: LoadStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    pub automatic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<LoadStatusHistory> for StatusHistoryResponse {
    fn from(entry: LoadStatusHistory) -> Self {
        Self {
            previous_status: entry.previous_status,
            new_status: entry.new_status,
            changed_at: entry.changed_at,
            changed_by: entry.changed_by,
            automatic: entry.automatic,
            reason: entry.reason,
        }
    }
}
