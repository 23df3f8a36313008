//! Hours-of-Service entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{HosLog, HosViolation};

use super::parse_enum;

/// Database row mapping for the hos_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct HosLogEntity {
    pub log_id: Uuid,
    pub driver_id: Uuid,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub odometer: Option<f64>,
    pub source: String,
    pub edit_reason: Option<String>,
    pub certified: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<HosLogEntity> for HosLog {
    type Error = DomainError;

    fn try_from(entity: HosLogEntity) -> Result<Self, Self::Error> {
        Ok(HosLog {
            log_id: entity.log_id,
            driver_id: entity.driver_id,
            status: parse_enum(&entity.status, "hos_logs.status")?,
            start_time: entity.start_time,
            end_time: entity.end_time,
            latitude: entity.latitude,
            longitude: entity.longitude,
            odometer: entity.odometer,
            source: parse_enum(&entity.source, "hos_logs.source")?,
            edit_reason: entity.edit_reason,
            certified: entity.certified,
            created_at: entity.created_at,
        })
    }
}

/// Database row mapping for the hos_violations table.
#[derive(Debug, Clone, FromRow)]
pub struct HosViolationEntity {
    pub violation_id: Uuid,
    pub driver_id: Uuid,
    pub violation_type: String,
    pub severity: String,
    pub actual_hours: f64,
    pub limit_hours: f64,
    pub overage_hours: f64,
    pub flagged_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
}

impl TryFrom<HosViolationEntity> for HosViolation {
    type Error = DomainError;

    fn try_from(entity: HosViolationEntity) -> Result<Self, Self::Error> {
        Ok(HosViolation {
            violation_id: entity.violation_id,
            driver_id: entity.driver_id,
            violation_type: parse_enum(&entity.violation_type, "hos_violations.violation_type")?,
            severity: parse_enum(&entity.severity, "hos_violations.severity")?,
            actual_hours: entity.actual_hours,
            limit_hours: entity.limit_hours,
            overage_hours: entity.overage_hours,
            flagged_at: entity.flagged_at,
            resolved: entity.resolved,
            resolved_at: entity.resolved_at,
            resolution_note: entity.resolution_note,
        })
    }
}
