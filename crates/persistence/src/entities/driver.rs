//! Driver availability entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::DriverAvailability;

use super::parse_enum;

/// Database row mapping for the driver_availability table.
#[derive(Debug, Clone, FromRow)]
pub struct DriverAvailabilityEntity {
    pub driver_id: Uuid,
    pub status: String,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub hours_worked_today: f64,
    pub hours_worked_week: f64,
    pub assigned_tractor_id: Option<Uuid>,
    pub assigned_trailer_id: Option<Uuid>,
    pub on_time_delivery_rate: f64,
    pub acceptance_rate: f64,
    pub completed_loads: i32,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DriverAvailabilityEntity> for DriverAvailability {
    type Error = DomainError;

    fn try_from(entity: DriverAvailabilityEntity) -> Result<Self, Self::Error> {
        Ok(DriverAvailability {
            driver_id: entity.driver_id,
            status: parse_enum(&entity.status, "driver_availability.status")?,
            current_latitude: entity.current_latitude,
            current_longitude: entity.current_longitude,
            location_updated_at: entity.location_updated_at,
            hours_worked_today: entity.hours_worked_today,
            hours_worked_week: entity.hours_worked_week,
            assigned_tractor_id: entity.assigned_tractor_id,
            assigned_trailer_id: entity.assigned_trailer_id,
            on_time_delivery_rate: entity.on_time_delivery_rate,
            acceptance_rate: entity.acceptance_rate,
            completed_loads: entity.completed_loads,
            updated_at: entity.updated_at,
        })
    }
}
