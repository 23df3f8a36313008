//! Dispatch domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Dispatch State Enum
// ============================================================================

/// State of a dispatch in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    Pending,
    Accepted,
    Rejected,
    InProgress,
    Completed,
    Cancelled,
}

impl DispatchStatus {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Pending => "PENDING",
            DispatchStatus::Accepted => "ACCEPTED",
            DispatchStatus::Rejected => "REJECTED",
            DispatchStatus::InProgress => "IN_PROGRESS",
            DispatchStatus::Completed => "COMPLETED",
            DispatchStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal dispatches no longer count against the one-active-per-load rule.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Rejected | DispatchStatus::Completed | DispatchStatus::Cancelled
        )
    }

    /// Check if transition to target state is valid.
    pub fn can_transition_to(&self, target: DispatchStatus) -> bool {
        match (self, target) {
            (DispatchStatus::Pending, DispatchStatus::Accepted) => true,
            (DispatchStatus::Pending, DispatchStatus::Rejected) => true,
            (DispatchStatus::Accepted, DispatchStatus::InProgress) => true,
            (DispatchStatus::InProgress, DispatchStatus::Completed) => true,
            // Any non-terminal state can be cancelled
            (from, DispatchStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DispatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DispatchStatus::Pending),
            "ACCEPTED" => Ok(DispatchStatus::Accepted),
            "REJECTED" => Ok(DispatchStatus::Rejected),
            "IN_PROGRESS" => Ok(DispatchStatus::InProgress),
            "COMPLETED" => Ok(DispatchStatus::Completed),
            "CANCELLED" => Ok(DispatchStatus::Cancelled),
            _ => Err(format!("Invalid dispatch status: {}", s)),
        }
    }
}

/// How the dispatch was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchMethod {
    Manual,
    AutoMatched,
    DriverRequested,
}

impl DispatchMethod {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMethod::Manual => "MANUAL",
            DispatchMethod::AutoMatched => "AUTO_MATCHED",
            DispatchMethod::DriverRequested => "DRIVER_REQUESTED",
        }
    }
}

impl std::str::FromStr for DispatchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(DispatchMethod::Manual),
            "AUTO_MATCHED" => Ok(DispatchMethod::AutoMatched),
            "DRIVER_REQUESTED" => Ok(DispatchMethod::DriverRequested),
            _ => Err(format!("Invalid dispatch method: {}", s)),
        }
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// Auto-match scoring breakdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchScores {
    pub proximity_score: f64,
    pub availability_score: f64,
    pub performance_score: f64,
    pub total_score: f64,
}

/// The assignment of a load to a driver (plus optional equipment).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    pub dispatch_id: Uuid,
    pub load_id: Uuid,
    pub driver_id: Uuid,
    pub tractor_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub status: DispatchStatus,
    pub method: DispatchMethod,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: String,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    /// Present for auto-matched dispatches.
    pub scores: Option<DispatchScores>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Request payload for assigning a load to a driver.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignDispatchRequest {
    pub load_id: Uuid,
    pub driver_id: Uuid,
    pub tractor_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub method: DispatchMethod,

    #[validate(length(min = 1, max = 100, message = "assignedBy must be 1-100 characters"))]
    pub assigned_by: String,
}

/// Request payload for auto-matching the best available driver.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AutoMatchRequest {
    pub load_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "requestedBy must be 1-100 characters"))]
    pub requested_by: String,
}

/// Request payload for accepting a dispatch.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcceptDispatchRequest {
    #[validate(length(min = 1, max = 100, message = "actor must be 1-100 characters"))]
    pub actor: String,
}

/// Request payload for rejecting a dispatch. A reason is mandatory.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectDispatchRequest {
    #[validate(length(min = 1, max = 100, message = "actor must be 1-100 characters"))]
    pub actor: String,

    #[validate(length(min = 1, max = 500, message = "Rejection reason is required"))]
    pub reason: String,
}

/// Response payload for dispatch operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub dispatch_id: Uuid,
    pub load_id: Uuid,
    pub driver_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tractor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_id: Option<Uuid>,
    pub status: DispatchStatus,
    pub method: DispatchMethod,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<DispatchScores>,
}

impl From<Dispatch> for DispatchResponse {
    fn from(d: Dispatch) -> Self {
        Self {
            dispatch_id: d.dispatch_id,
            load_id: d.load_id,
            driver_id: d.driver_id,
            tractor_id: d.tractor_id,
            trailer_id: d.trailer_id,
            status: d.status,
            method: d.method,
            assigned_at: d.assigned_at,
            assigned_by: d.assigned_by,
            accepted_at: d.accepted_at,
            rejected_at: d.rejected_at,
            rejection_reason: d.rejection_reason,
            scores: d.scores,
        }
    }
}
