//! Dispatch entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{Dispatch, DispatchScores};

use super::parse_enum;

/// Database row mapping for the dispatches table.
#[derive(Debug, Clone, FromRow)]
pub struct DispatchEntity {
    pub dispatch_id: Uuid,
    pub load_id: Uuid,
    pub driver_id: Uuid,
    pub tractor_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub status: String,
    pub method: String,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: String,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub proximity_score: Option<f64>,
    pub availability_score: Option<f64>,
    pub performance_score: Option<f64>,
    pub total_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DispatchEntity> for Dispatch {
    type Error = DomainError;

    fn try_from(entity: DispatchEntity) -> Result<Self, Self::Error> {
        // All four score columns are written together for auto-matched rows.
        let scores = match (
            entity.proximity_score,
            entity.availability_score,
            entity.performance_score,
            entity.total_score,
        ) {
            (Some(proximity), Some(availability), Some(performance), Some(total)) => {
                Some(DispatchScores {
                    proximity_score: proximity,
                    availability_score: availability,
                    performance_score: performance,
                    total_score: total,
                })
            }
            _ => None,
        };

        Ok(Dispatch {
            dispatch_id: entity.dispatch_id,
            load_id: entity.load_id,
            driver_id: entity.driver_id,
            tractor_id: entity.tractor_id,
            trailer_id: entity.trailer_id,
            status: parse_enum(&entity.status, "dispatches.status")?,
            method: parse_enum(&entity.method, "dispatches.method")?,
            assigned_at: entity.assigned_at,
            assigned_by: entity.assigned_by,
            accepted_at: entity.accepted_at,
            rejected_at: entity.rejected_at,
            rejection_reason: entity.rejection_reason,
            scores,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
