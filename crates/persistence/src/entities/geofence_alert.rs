//! Geofence alert entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::GeofenceAlert;

use super::parse_enum;

/// Database row mapping for the geofence_alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct GeofenceAlertEntity {
    pub alert_id: Uuid,
    pub alert_type: String,
    pub driver_id: Uuid,
    pub dispatch_id: Uuid,
    pub location_id: i64,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
}

impl TryFrom<GeofenceAlertEntity> for GeofenceAlert {
    type Error = DomainError;

    fn try_from(entity: GeofenceAlertEntity) -> Result<Self, Self::Error> {
        Ok(GeofenceAlert {
            alert_id: entity.alert_id,
            alert_type: parse_enum(&entity.alert_type, "geofence_alerts.alert_type")?,
            driver_id: entity.driver_id,
            dispatch_id: entity.dispatch_id,
            location_id: entity.location_id,
            created_at: entity.created_at,
            acknowledged: entity.acknowledged,
            acknowledged_at: entity.acknowledged_at,
            acknowledged_by: entity.acknowledged_by,
        })
    }
}
