//! Driver location repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::DriverLocation;
use domain::repositories::{LocationRepository, NewLocation};

use crate::entities::DriverLocationEntity;
use crate::metrics::QueryTimer;

use super::db_err;

const LOCATION_COLUMNS: &str = r#"
    id, driver_id, latitude, longitude, accuracy, speed, heading,
    dispatch_id, recorded_at, source, created_at
"#;

/// Repository for driver location database operations.
#[derive(Clone)]
pub struct PgLocationRepository {
    pool: PgPool,
}

impl PgLocationRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LocationRepository for PgLocationRepository {
    async fn append(&self, location: NewLocation) -> Result<DriverLocation, DomainError> {
        let timer = QueryTimer::new("append_driver_location");

        let entity = sqlx::query_as::<_, DriverLocationEntity>(&format!(
            r#"
            INSERT INTO driver_locations (
                driver_id, latitude, longitude, accuracy, speed, heading,
                dispatch_id, recorded_at, source
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(location.driver_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.accuracy)
        .bind(location.speed)
        .bind(location.heading)
        .bind(location.dispatch_id)
        .bind(location.recorded_at)
        .bind(&location.source)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("append_driver_location", e))?;

        timer.record();
        Ok(DriverLocation::from(entity))
    }

    async fn latest_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Option<DriverLocation>, DomainError> {
        let timer = QueryTimer::new("find_latest_location");

        let entity = sqlx::query_as::<_, DriverLocationEntity>(&format!(
            r#"
            SELECT {} FROM driver_locations
            WHERE driver_id = $1
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
            LOCATION_COLUMNS
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_latest_location", e))?;

        timer.record();
        Ok(entity.map(DriverLocation::from))
    }

    async fn history(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DriverLocation>, DomainError> {
        let timer = QueryTimer::new("find_location_history");

        let entities = sqlx::query_as::<_, DriverLocationEntity>(&format!(
            r#"
            SELECT {} FROM driver_locations
            WHERE driver_id = $1 AND recorded_at >= $2
            ORDER BY recorded_at ASC, id ASC
            "#,
            LOCATION_COLUMNS
        ))
        .bind(driver_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("find_location_history", e))?;

        timer.record();
        Ok(entities.into_iter().map(DriverLocation::from).collect())
    }

    async fn active_trackers(&self) -> Result<Vec<DriverLocation>, DomainError> {
        let timer = QueryTimer::new("find_active_trackers");

        // Latest ping per driver that is attached to a dispatch.
        let entities = sqlx::query_as::<_, DriverLocationEntity>(&format!(
            r#"
            SELECT DISTINCT ON (driver_id) {}
            FROM driver_locations
            WHERE dispatch_id IS NOT NULL
            ORDER BY driver_id, recorded_at DESC, id DESC
            "#,
            LOCATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("find_active_trackers", e))?;

        timer.record();
        Ok(entities.into_iter().map(DriverLocation::from).collect())
    }
}
