//! Driver availability repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::DriverAvailability;
use domain::repositories::DriverAvailabilityRepository;

use crate::entities::DriverAvailabilityEntity;
use crate::metrics::QueryTimer;

use super::db_err;

const AVAILABILITY_COLUMNS: &str = r#"
    driver_id, status, current_latitude, current_longitude, location_updated_at,
    hours_worked_today, hours_worked_week,
    assigned_tractor_id, assigned_trailer_id,
    on_time_delivery_rate, acceptance_rate, completed_loads, updated_at
"#;

/// Repository for driver availability database operations.
#[derive(Clone)]
pub struct PgDriverAvailabilityRepository {
    pool: PgPool,
}

impl PgDriverAvailabilityRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DriverAvailabilityRepository for PgDriverAvailabilityRepository {
    async fn get(&self, driver_id: Uuid) -> Result<Option<DriverAvailability>, DomainError> {
        let timer = QueryTimer::new("find_driver_availability");

        let entity = sqlx::query_as::<_, DriverAvailabilityEntity>(&format!(
            "SELECT {} FROM driver_availability WHERE driver_id = $1",
            AVAILABILITY_COLUMNS
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_driver_availability", e))?;

        timer.record();
        entity.map(DriverAvailability::try_from).transpose()
    }

    async fn update(
        &self,
        availability: &DriverAvailability,
    ) -> Result<DriverAvailability, DomainError> {
        let timer = QueryTimer::new("upsert_driver_availability");

        // Latest-wins upsert: availability rows are live state, superseded by
        // every newer write.
        let entity = sqlx::query_as::<_, DriverAvailabilityEntity>(&format!(
            r#"
            INSERT INTO driver_availability (
                driver_id, status, current_latitude, current_longitude,
                location_updated_at, hours_worked_today, hours_worked_week,
                assigned_tractor_id, assigned_trailer_id,
                on_time_delivery_rate, acceptance_rate, completed_loads, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (driver_id) DO UPDATE SET
                status = EXCLUDED.status,
                current_latitude = EXCLUDED.current_latitude,
                current_longitude = EXCLUDED.current_longitude,
                location_updated_at = EXCLUDED.location_updated_at,
                hours_worked_today = EXCLUDED.hours_worked_today,
                hours_worked_week = EXCLUDED.hours_worked_week,
                assigned_tractor_id = EXCLUDED.assigned_tractor_id,
                assigned_trailer_id = EXCLUDED.assigned_trailer_id,
                on_time_delivery_rate = EXCLUDED.on_time_delivery_rate,
                acceptance_rate = EXCLUDED.acceptance_rate,
                completed_loads = EXCLUDED.completed_loads,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            AVAILABILITY_COLUMNS
        ))
        .bind(availability.driver_id)
        .bind(availability.status.as_str())
        .bind(availability.current_latitude)
        .bind(availability.current_longitude)
        .bind(availability.location_updated_at)
        .bind(availability.hours_worked_today)
        .bind(availability.hours_worked_week)
        .bind(availability.assigned_tractor_id)
        .bind(availability.assigned_trailer_id)
        .bind(availability.on_time_delivery_rate)
        .bind(availability.acceptance_rate)
        .bind(availability.completed_loads)
        .bind(availability.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("upsert_driver_availability", e))?;

        timer.record();
        DriverAvailability::try_from(entity)
    }

    async fn list_available(&self) -> Result<Vec<DriverAvailability>, DomainError> {
        let timer = QueryTimer::new("list_available_drivers");

        let entities = sqlx::query_as::<_, DriverAvailabilityEntity>(&format!(
            "SELECT {} FROM driver_availability WHERE status = 'AVAILABLE'",
            AVAILABILITY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_available_drivers", e))?;

        timer.record();
        entities.into_iter().map(DriverAvailability::try_from).collect()
    }
}
