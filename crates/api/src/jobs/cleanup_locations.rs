//! Location retention background job.

use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Hourly job that prunes GPS pings older than the retention window.
pub struct CleanupLocationsJob {
    pool: PgPool,
    retention_days: u32,
    batch_size: i64,
}

impl CleanupLocationsJob {
    pub fn new(pool: PgPool, retention_days: u32) -> Self {
        Self {
            pool,
            retention_days,
            batch_size: 10_000,
        }
    }

    /// Delete old pings in batches to avoid long locks.
    async fn delete_old_locations(&self) -> Result<u64, sqlx::Error> {
        let mut total_deleted: u64 = 0;

        loop {
            let result = sqlx::query(
                r#"
                WITH to_delete AS (
                    SELECT id FROM driver_locations
                    WHERE recorded_at < NOW() - ($1 || ' days')::INTERVAL
                    LIMIT $2
                )
                DELETE FROM driver_locations
                WHERE id IN (SELECT id FROM to_delete)
                "#,
            )
            .bind(self.retention_days as i32)
            .bind(self.batch_size)
            .execute(&self.pool)
            .await?;

            let deleted = result.rows_affected();
            total_deleted += deleted;

            if deleted < self.batch_size as u64 {
                break;
            }

            tokio::task::yield_now().await;
        }

        Ok(total_deleted)
    }
}

#[async_trait::async_trait]
impl Job for CleanupLocationsJob {
    fn name(&self) -> &'static str {
        "cleanup_locations"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), String> {
        let deleted = self
            .delete_old_locations()
            .await
            .map_err(|e| format!("Failed to delete old locations: {}", e))?;

        info!(
            deleted,
            retention_days = self.retention_days,
            "Cleaned up old locations"
        );

        Ok(())
    }
}
