//! Driver location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::DriverLocation;

/// Database row mapping for the driver_locations table.
#[derive(Debug, Clone, FromRow)]
pub struct DriverLocationEntity {
    pub id: i64,
    pub driver_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub dispatch_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl From<DriverLocationEntity> for DriverLocation {
    fn from(entity: DriverLocationEntity) -> Self {
        Self {
            id: entity.id,
            driver_id: entity.driver_id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            accuracy: entity.accuracy,
            speed: entity.speed,
            heading: entity.heading,
            dispatch_id: entity.dispatch_id,
            recorded_at: entity.recorded_at,
            source: entity.source,
            created_at: entity.created_at,
        }
    }
}
