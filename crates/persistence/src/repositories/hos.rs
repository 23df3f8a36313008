//! Hours-of-Service repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{HosLog, HosViolation};
use domain::repositories::{HosRepository, NewHosLog, NewHosViolation};

use crate::entities::{HosLogEntity, HosViolationEntity};
use crate::metrics::QueryTimer;

use super::{db_err, is_unique_violation};

const LOG_COLUMNS: &str = r#"
    log_id, driver_id, status, start_time, end_time,
    latitude, longitude, odometer, source, edit_reason, certified, created_at
"#;

const VIOLATION_COLUMNS: &str = r#"
    violation_id, driver_id, violation_type, severity,
    actual_hours, limit_hours, overage_hours,
    flagged_at, resolved, resolved_at, resolution_note
"#;

/// Repository for Hours-of-Service database operations.
#[derive(Clone)]
pub struct PgHosRepository {
    pool: PgPool,
}

impl PgHosRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HosRepository for PgHosRepository {
    async fn active_log(&self, driver_id: Uuid) -> Result<Option<HosLog>, DomainError> {
        let timer = QueryTimer::new("find_active_hos_log");

        let entity = sqlx::query_as::<_, HosLogEntity>(&format!(
            "SELECT {} FROM hos_logs WHERE driver_id = $1 AND end_time IS NULL",
            LOG_COLUMNS
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_active_hos_log", e))?;

        timer.record();
        entity.map(HosLog::try_from).transpose()
    }

    async fn get_log(&self, log_id: Uuid) -> Result<Option<HosLog>, DomainError> {
        let timer = QueryTimer::new("find_hos_log");

        let entity = sqlx::query_as::<_, HosLogEntity>(&format!(
            "SELECT {} FROM hos_logs WHERE log_id = $1",
            LOG_COLUMNS
        ))
        .bind(log_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_hos_log", e))?;

        timer.record();
        entity.map(HosLog::try_from).transpose()
    }

    async fn append_log(&self, log: NewHosLog) -> Result<HosLog, DomainError> {
        let timer = QueryTimer::new("append_hos_log");

        let result = sqlx::query_as::<_, HosLogEntity>(&format!(
            r#"
            INSERT INTO hos_logs (
                log_id, driver_id, status, start_time,
                latitude, longitude, odometer, source
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(log.driver_id)
        .bind(log.status.as_str())
        .bind(log.start_time)
        .bind(log.latitude)
        .bind(log.longitude)
        .bind(log.odometer)
        .bind(log.source.as_str())
        .fetch_one(&self.pool)
        .await;

        timer.record();

        match result {
            Ok(entity) => HosLog::try_from(entity),
            // The partial unique index on open logs catches a racing second
            // insert for the same driver.
            Err(e) if is_unique_violation(&e) => Err(DomainError::Conflict(format!(
                "Driver {} already has an open duty log",
                log.driver_id
            ))),
            Err(e) => Err(db_err("append_hos_log", e)),
        }
    }

    async fn close_log(
        &self,
        log_id: Uuid,
        end_time: DateTime<Utc>,
    ) -> Result<HosLog, DomainError> {
        let timer = QueryTimer::new("close_hos_log");

        let entity = sqlx::query_as::<_, HosLogEntity>(&format!(
            r#"
            UPDATE hos_logs SET end_time = $2
            WHERE log_id = $1 AND end_time IS NULL
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(log_id)
        .bind(end_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("close_hos_log", e))?;

        timer.record();

        match entity {
            Some(entity) => HosLog::try_from(entity),
            None => match self.get_log(log_id).await? {
                Some(_) => Err(DomainError::Conflict(format!(
                    "Duty log {} is already closed",
                    log_id
                ))),
                None => Err(DomainError::NotFound(format!("Duty log {} not found", log_id))),
            },
        }
    }

    async fn update_log(&self, log: &HosLog) -> Result<HosLog, DomainError> {
        let timer = QueryTimer::new("update_hos_log");

        let entity = sqlx::query_as::<_, HosLogEntity>(&format!(
            r#"
            UPDATE hos_logs SET
                status = $2,
                start_time = $3,
                end_time = $4,
                latitude = $5,
                longitude = $6,
                odometer = $7,
                source = $8,
                edit_reason = $9,
                certified = $10
            WHERE log_id = $1
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(log.log_id)
        .bind(log.status.as_str())
        .bind(log.start_time)
        .bind(log.end_time)
        .bind(log.latitude)
        .bind(log.longitude)
        .bind(log.odometer)
        .bind(log.source.as_str())
        .bind(&log.edit_reason)
        .bind(log.certified)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("update_hos_log", e))?;

        timer.record();

        entity
            .ok_or_else(|| DomainError::NotFound(format!("Duty log {} not found", log.log_id)))
            .and_then(HosLog::try_from)
    }

    async fn logs_since(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<HosLog>, DomainError> {
        let timer = QueryTimer::new("find_hos_logs_since");

        let entities = sqlx::query_as::<_, HosLogEntity>(&format!(
            r#"
            SELECT {} FROM hos_logs
            WHERE driver_id = $1 AND (end_time IS NULL OR end_time > $2)
            ORDER BY start_time ASC
            "#,
            LOG_COLUMNS
        ))
        .bind(driver_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("find_hos_logs_since", e))?;

        timer.record();
        entities.into_iter().map(HosLog::try_from).collect()
    }

    async fn append_violation(
        &self,
        violation: NewHosViolation,
    ) -> Result<HosViolation, DomainError> {
        let timer = QueryTimer::new("append_hos_violation");

        let entity = sqlx::query_as::<_, HosViolationEntity>(&format!(
            r#"
            INSERT INTO hos_violations (
                violation_id, driver_id, violation_type, severity,
                actual_hours, limit_hours, overage_hours
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            VIOLATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(violation.driver_id)
        .bind(violation.violation_type.as_str())
        .bind(violation.severity.as_str())
        .bind(violation.actual_hours)
        .bind(violation.limit_hours)
        .bind(violation.overage_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("append_hos_violation", e))?;

        timer.record();
        HosViolation::try_from(entity)
    }

    async fn get_violation(
        &self,
        violation_id: Uuid,
    ) -> Result<Option<HosViolation>, DomainError> {
        let timer = QueryTimer::new("find_hos_violation");

        let entity = sqlx::query_as::<_, HosViolationEntity>(&format!(
            "SELECT {} FROM hos_violations WHERE violation_id = $1",
            VIOLATION_COLUMNS
        ))
        .bind(violation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_hos_violation", e))?;

        timer.record();
        entity.map(HosViolation::try_from).transpose()
    }

    async fn unresolved_violations(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<HosViolation>, DomainError> {
        let timer = QueryTimer::new("find_unresolved_hos_violations");

        let entities = sqlx::query_as::<_, HosViolationEntity>(&format!(
            r#"
            SELECT {} FROM hos_violations
            WHERE driver_id = $1 AND NOT resolved
            ORDER BY flagged_at DESC, violation_id DESC
            "#,
            VIOLATION_COLUMNS
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("find_unresolved_hos_violations", e))?;

        timer.record();
        entities.into_iter().map(HosViolation::try_from).collect()
    }

    async fn resolve_violation(
        &self,
        violation_id: Uuid,
        note: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<HosViolation, DomainError> {
        let timer = QueryTimer::new("resolve_hos_violation");

        let entity = sqlx::query_as::<_, HosViolationEntity>(&format!(
            r#"
            UPDATE hos_violations SET
                resolved = TRUE,
                resolved_at = $2,
                resolution_note = $3
            WHERE violation_id = $1 AND NOT resolved
            RETURNING {}
            "#,
            VIOLATION_COLUMNS
        ))
        .bind(violation_id)
        .bind(resolved_at)
        .bind(note)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("resolve_hos_violation", e))?;

        timer.record();

        match entity {
            Some(entity) => HosViolation::try_from(entity),
            // Already resolved violations come back unchanged.
            None => self.get_violation(violation_id).await?.ok_or_else(|| {
                DomainError::NotFound(format!("Violation {} not found", violation_id))
            }),
        }
    }
}
