//! Load repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{Load, LoadStatusHistory};
use domain::repositories::{LoadRepository, NewStatusHistory};

use crate::entities::{LoadEntity, LoadStatusHistoryEntity};
use crate::metrics::QueryTimer;

use super::db_err;

const LOAD_COLUMNS: &str = r#"
    load_id, reference, customer_id, carrier_id, load_type,
    status, status_before_exception,
    pickup_address, pickup_latitude, pickup_longitude,
    pickup_window_start, pickup_window_end,
    delivery_address, delivery_latitude, delivery_longitude,
    delivery_window_start, delivery_window_end,
    linehaul_rate, fuel_surcharge, total_charge,
    driver_id, tractor_id, trailer_id,
    picked_up_at, delivered_at, pod_document_id,
    version, created_at, updated_at
"#;

/// Repository for load database operations.
#[derive(Clone)]
pub struct PgLoadRepository {
    pool: PgPool,
}

impl PgLoadRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LoadRepository for PgLoadRepository {
    async fn get(&self, load_id: Uuid) -> Result<Option<Load>, DomainError> {
        let timer = QueryTimer::new("find_load_by_id");

        let entity = sqlx::query_as::<_, LoadEntity>(&format!(
            "SELECT {} FROM loads WHERE load_id = $1",
            LOAD_COLUMNS
        ))
        .bind(load_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_load_by_id", e))?;

        timer.record();
        entity.map(Load::try_from).transpose()
    }

    async fn update(&self, load: &Load) -> Result<Load, DomainError> {
        let timer = QueryTimer::new("update_load");

        // Optimistic concurrency: the write only lands if the version the
        // caller read is still current.
        let entity = sqlx::query_as::<_, LoadEntity>(&format!(
            r#"
            UPDATE loads SET
                status = $3,
                status_before_exception = $4,
                driver_id = $5,
                tractor_id = $6,
                trailer_id = $7,
                picked_up_at = $8,
                delivered_at = $9,
                pod_document_id = $10,
                total_charge = $11,
                version = version + 1,
                updated_at = $12
            WHERE load_id = $1 AND version = $2
            RETURNING {}
            "#,
            LOAD_COLUMNS
        ))
        .bind(load.load_id)
        .bind(load.version)
        .bind(load.status.as_str())
        .bind(load.status_before_exception.map(|s| s.as_str()))
        .bind(load.driver_id)
        .bind(load.tractor_id)
        .bind(load.trailer_id)
        .bind(load.picked_up_at)
        .bind(load.delivered_at)
        .bind(load.pod_document_id)
        .bind(load.total_charge)
        .bind(load.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("update_load", e))?;

        timer.record();

        match entity {
            Some(entity) => Load::try_from(entity),
            None => {
                if self.get(load.load_id).await?.is_some() {
                    Err(DomainError::Conflict(format!(
                        "Load {} was modified concurrently",
                        load.load_id
                    )))
                } else {
                    Err(DomainError::NotFound(format!("Load {} not found", load.load_id)))
                }
            }
        }
    }

    async fn append_history(
        &self,
        entry: NewStatusHistory,
    ) -> Result<LoadStatusHistory, DomainError> {
        let timer = QueryTimer::new("append_load_status_history");

        let entity = sqlx::query_as::<_, LoadStatusHistoryEntity>(
            r#"
            INSERT INTO load_status_history (
                load_id, previous_status, new_status, changed_at,
                changed_by, automatic, latitude, longitude, reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, load_id, previous_status, new_status, changed_at,
                      changed_by, automatic, latitude, longitude, reason
            "#,
        )
        .bind(entry.load_id)
        .bind(entry.previous_status.as_str())
        .bind(entry.new_status.as_str())
        .bind(entry.changed_at)
        .bind(&entry.changed_by)
        .bind(entry.automatic)
        .bind(entry.latitude)
        .bind(entry.longitude)
        .bind(&entry.reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("append_load_status_history", e))?;

        timer.record();
        LoadStatusHistory::try_from(entity)
    }

    async fn history(&self, load_id: Uuid) -> Result<Vec<LoadStatusHistory>, DomainError> {
        let timer = QueryTimer::new("find_load_status_history");

        let entities = sqlx::query_as::<_, LoadStatusHistoryEntity>(
            r#"
            SELECT id, load_id, previous_status, new_status, changed_at,
                   changed_by, automatic, latitude, longitude, reason
            FROM load_status_history
            WHERE load_id = $1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(load_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("find_load_status_history", e))?;

        timer.record();
        entities.into_iter().map(LoadStatusHistory::try_from).collect()
    }
}

impl PgLoadRepository {
    /// Inserts a new load. Used by fixtures and the booking surface.
    pub async fn create(&self, load: &Load) -> Result<Load, DomainError> {
        let timer = QueryTimer::new("create_load");

        let entity = sqlx::query_as::<_, LoadEntity>(&format!(
            r#"
            INSERT INTO loads (
                load_id, reference, customer_id, carrier_id, load_type,
                status, status_before_exception,
                pickup_address, pickup_latitude, pickup_longitude,
                pickup_window_start, pickup_window_end,
                delivery_address, delivery_latitude, delivery_longitude,
                delivery_window_start, delivery_window_end,
                linehaul_rate, fuel_surcharge, total_charge,
                driver_id, tractor_id, trailer_id,
                picked_up_at, delivered_at, pod_document_id,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24,
                    $25, $26, $27, $28, $29)
            RETURNING {}
            "#,
            LOAD_COLUMNS
        ))
        .bind(load.load_id)
        .bind(&load.reference)
        .bind(load.customer_id)
        .bind(load.carrier_id)
        .bind(&load.load_type)
        .bind(load.status.as_str())
        .bind(load.status_before_exception.map(|s| s.as_str()))
        .bind(&load.pickup.address)
        .bind(load.pickup.latitude)
        .bind(load.pickup.longitude)
        .bind(load.pickup.window_start)
        .bind(load.pickup.window_end)
        .bind(&load.delivery.address)
        .bind(load.delivery.latitude)
        .bind(load.delivery.longitude)
        .bind(load.delivery.window_start)
        .bind(load.delivery.window_end)
        .bind(load.linehaul_rate)
        .bind(load.fuel_surcharge)
        .bind(load.total_charge)
        .bind(load.driver_id)
        .bind(load.tractor_id)
        .bind(load.trailer_id)
        .bind(load.picked_up_at)
        .bind(load.delivered_at)
        .bind(load.pod_document_id)
        .bind(load.version)
        .bind(load.created_at)
        .bind(load.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("create_load", e))?;

        timer.record();
        Load::try_from(entity)
    }
}
