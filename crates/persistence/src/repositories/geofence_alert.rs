//! Geofence alert repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::GeofenceAlert;
use domain::repositories::{GeofenceAlertRepository, NewGeofenceAlert};

use crate::entities::GeofenceAlertEntity;
use crate::metrics::QueryTimer;

use super::db_err;

const ALERT_COLUMNS: &str = r#"
    alert_id, alert_type, driver_id, dispatch_id, location_id,
    created_at, acknowledged, acknowledged_at, acknowledged_by
"#;

/// Repository for geofence alert database operations.
#[derive(Clone)]
pub struct PgGeofenceAlertRepository {
    pool: PgPool,
}

impl PgGeofenceAlertRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GeofenceAlertRepository for PgGeofenceAlertRepository {
    async fn append(&self, alert: NewGeofenceAlert) -> Result<GeofenceAlert, DomainError> {
        let timer = QueryTimer::new("append_geofence_alert");

        let entity = sqlx::query_as::<_, GeofenceAlertEntity>(&format!(
            r#"
            INSERT INTO geofence_alerts (alert_id, alert_type, driver_id, dispatch_id, location_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(alert.alert_type.as_str())
        .bind(alert.driver_id)
        .bind(alert.dispatch_id)
        .bind(alert.location_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("append_geofence_alert", e))?;

        timer.record();
        GeofenceAlert::try_from(entity)
    }

    async fn get(&self, alert_id: Uuid) -> Result<Option<GeofenceAlert>, DomainError> {
        let timer = QueryTimer::new("find_geofence_alert");

        let entity = sqlx::query_as::<_, GeofenceAlertEntity>(&format!(
            "SELECT {} FROM geofence_alerts WHERE alert_id = $1",
            ALERT_COLUMNS
        ))
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_geofence_alert", e))?;

        timer.record();
        entity.map(GeofenceAlert::try_from).transpose()
    }

    async fn pending(&self) -> Result<Vec<GeofenceAlert>, DomainError> {
        let timer = QueryTimer::new("find_pending_geofence_alerts");

        let entities = sqlx::query_as::<_, GeofenceAlertEntity>(&format!(
            r#"
            SELECT {} FROM geofence_alerts
            WHERE NOT acknowledged
            ORDER BY created_at DESC, alert_id DESC
            "#,
            ALERT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("find_pending_geofence_alerts", e))?;

        timer.record();
        entities.into_iter().map(GeofenceAlert::try_from).collect()
    }

    async fn acknowledge(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
        acknowledged_at: DateTime<Utc>,
    ) -> Result<GeofenceAlert, DomainError> {
        let timer = QueryTimer::new("acknowledge_geofence_alert");

        let entity = sqlx::query_as::<_, GeofenceAlertEntity>(&format!(
            r#"
            UPDATE geofence_alerts SET
                acknowledged = TRUE,
                acknowledged_by = $2,
                acknowledged_at = $3
            WHERE alert_id = $1 AND NOT acknowledged
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(alert_id)
        .bind(acknowledged_by)
        .bind(acknowledged_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("acknowledge_geofence_alert", e))?;

        timer.record();

        match entity {
            Some(entity) => GeofenceAlert::try_from(entity),
            // Already acknowledged alerts come back unchanged so the
            // operation stays idempotent.
            None => self.get(alert_id).await?.ok_or_else(|| {
                DomainError::NotFound(format!("Geofence alert {} not found", alert_id))
            }),
        }
    }
}
