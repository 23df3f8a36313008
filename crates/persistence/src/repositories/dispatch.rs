//! Dispatch repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::Dispatch;
use domain::repositories::DispatchRepository;

use crate::entities::DispatchEntity;
use crate::metrics::QueryTimer;

use super::{db_err, is_unique_violation};

const DISPATCH_COLUMNS: &str = r#"
    dispatch_id, load_id, driver_id, tractor_id, trailer_id,
    status, method, assigned_at, assigned_by,
    accepted_at, rejected_at, rejection_reason,
    proximity_score, availability_score, performance_score, total_score,
    created_at, updated_at
"#;

const ACTIVE_STATUSES: &str = "('PENDING', 'ACCEPTED', 'IN_PROGRESS')";

/// Repository for dispatch database operations.
#[derive(Clone)]
pub struct PgDispatchRepository {
    pool: PgPool,
}

impl PgDispatchRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DispatchRepository for PgDispatchRepository {
    async fn get(&self, dispatch_id: Uuid) -> Result<Option<Dispatch>, DomainError> {
        let timer = QueryTimer::new("find_dispatch_by_id");

        let entity = sqlx::query_as::<_, DispatchEntity>(&format!(
            "SELECT {} FROM dispatches WHERE dispatch_id = $1",
            DISPATCH_COLUMNS
        ))
        .bind(dispatch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_dispatch_by_id", e))?;

        timer.record();
        entity.map(Dispatch::try_from).transpose()
    }

    async fn get_active_by_load(&self, load_id: Uuid) -> Result<Option<Dispatch>, DomainError> {
        let timer = QueryTimer::new("find_active_dispatch_by_load");

        let entity = sqlx::query_as::<_, DispatchEntity>(&format!(
            "SELECT {} FROM dispatches WHERE load_id = $1 AND status IN {}",
            DISPATCH_COLUMNS, ACTIVE_STATUSES
        ))
        .bind(load_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_active_dispatch_by_load", e))?;

        timer.record();
        entity.map(Dispatch::try_from).transpose()
    }

    async fn get_active_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Option<Dispatch>, DomainError> {
        let timer = QueryTimer::new("find_active_dispatch_by_driver");

        let entity = sqlx::query_as::<_, DispatchEntity>(&format!(
            r#"
            SELECT {} FROM dispatches
            WHERE driver_id = $1 AND status IN {}
            ORDER BY assigned_at DESC
            LIMIT 1
            "#,
            DISPATCH_COLUMNS, ACTIVE_STATUSES
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_active_dispatch_by_driver", e))?;

        timer.record();
        entity.map(Dispatch::try_from).transpose()
    }

    async fn create(&self, dispatch: &Dispatch) -> Result<Dispatch, DomainError> {
        let timer = QueryTimer::new("create_dispatch");

        let scores = dispatch.scores;
        let result = sqlx::query_as::<_, DispatchEntity>(&format!(
            r#"
            INSERT INTO dispatches (
                dispatch_id, load_id, driver_id, tractor_id, trailer_id,
                status, method, assigned_at, assigned_by,
                accepted_at, rejected_at, rejection_reason,
                proximity_score, availability_score, performance_score, total_score,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18)
            RETURNING {}
            "#,
            DISPATCH_COLUMNS
        ))
        .bind(dispatch.dispatch_id)
        .bind(dispatch.load_id)
        .bind(dispatch.driver_id)
        .bind(dispatch.tractor_id)
        .bind(dispatch.trailer_id)
        .bind(dispatch.status.as_str())
        .bind(dispatch.method.as_str())
        .bind(dispatch.assigned_at)
        .bind(&dispatch.assigned_by)
        .bind(dispatch.accepted_at)
        .bind(dispatch.rejected_at)
        .bind(&dispatch.rejection_reason)
        .bind(scores.map(|s| s.proximity_score))
        .bind(scores.map(|s| s.availability_score))
        .bind(scores.map(|s| s.performance_score))
        .bind(scores.map(|s| s.total_score))
        .bind(dispatch.created_at)
        .bind(dispatch.updated_at)
        .fetch_one(&self.pool)
        .await;

        timer.record();

        match result {
            Ok(entity) => Dispatch::try_from(entity),
            // The partial unique index on active dispatches turns a racing
            // second assignment into a conflict.
            Err(e) if is_unique_violation(&e) => Err(DomainError::Conflict(format!(
                "Load {} already has an active dispatch",
                dispatch.load_id
            ))),
            Err(e) => Err(db_err("create_dispatch", e)),
        }
    }

    async fn update(&self, dispatch: &Dispatch) -> Result<Dispatch, DomainError> {
        let timer = QueryTimer::new("update_dispatch");

        let entity = sqlx::query_as::<_, DispatchEntity>(&format!(
            r#"
            UPDATE dispatches SET
                status = $2,
                accepted_at = $3,
                rejected_at = $4,
                rejection_reason = $5,
                updated_at = $6
            WHERE dispatch_id = $1
            RETURNING {}
            "#,
            DISPATCH_COLUMNS
        ))
        .bind(dispatch.dispatch_id)
        .bind(dispatch.status.as_str())
        .bind(dispatch.accepted_at)
        .bind(dispatch.rejected_at)
        .bind(&dispatch.rejection_reason)
        .bind(dispatch.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("update_dispatch", e))?;

        timer.record();

        entity
            .ok_or_else(|| {
                DomainError::NotFound(format!("Dispatch {} not found", dispatch.dispatch_id))
            })
            .and_then(Dispatch::try_from)
    }
}
