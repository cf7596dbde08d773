//! Postgres-backed per-workspace usage counter.
//!
//! Adjustments go through a ledger keyed on `(operation, file_id)` and an
//! atomic in-place update of the workspace counter, in one transaction.
//! The ledger makes replays no-ops, so a service retry after a partial
//! failure cannot double-count a file.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_core::traits::{UsageCounter, UsageOperation};

/// [`UsageCounter`] implementation over the `workspaces` counter column.
#[derive(Debug, Clone)]
pub struct WorkspaceUsageCounter {
    pool: PgPool,
}

impl WorkspaceUsageCounter {
    /// Create a new counter over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageCounter for WorkspaceUsageCounter {
    async fn adjust(
        &self,
        workspace_id: Uuid,
        delta_bytes: i64,
        operation: UsageOperation,
        file_id: Uuid,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let recorded = sqlx::query(
            "INSERT INTO usage_adjustments (workspace_id, operation, file_id, delta_bytes) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (operation, file_id) DO NOTHING",
        )
        .bind(workspace_id)
        .bind(operation.as_str())
        .bind(file_id)
        .bind(delta_bytes)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record usage adjustment", e)
        })?;

        if recorded.rows_affected() == 0 {
            // Replay of an already-applied adjustment.
            debug!(
                workspace_id = %workspace_id,
                file_id = %file_id,
                operation = operation.as_str(),
                "Skipping duplicate usage adjustment"
            );
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
            })?;
            return Ok(());
        }

        // Clamped at zero: a deletion racing a reconcile must not drive
        // the counter negative.
        sqlx::query(
            "UPDATE workspaces \
             SET storage_used_bytes = GREATEST(storage_used_bytes + $2, 0) \
             WHERE id = $1",
        )
        .bind(workspace_id)
        .bind(delta_bytes)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to adjust usage counter", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit usage adjustment", e)
        })?;

        debug!(
            workspace_id = %workspace_id,
            delta_bytes,
            operation = operation.as_str(),
            "Applied usage adjustment"
        );
        Ok(())
    }

    async fn current(&self, workspace_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT storage_used_bytes FROM workspaces WHERE id = $1")
            .bind(workspace_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read counter", e))?
            .ok_or_else(|| AppError::not_found(format!("Workspace {workspace_id} not found")))
    }

    async fn reconcile(&self, workspace_id: Uuid) -> AppResult<i64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Lock the row so a concurrent adjust serializes behind us.
        let recorded: i64 = sqlx::query_scalar(
            "SELECT storage_used_bytes FROM workspaces WHERE id = $1 FOR UPDATE",
        )
        .bind(workspace_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read counter", e))?
        .ok_or_else(|| AppError::not_found(format!("Workspace {workspace_id} not found")))?;

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(f.file_size), 0)::BIGINT \
             FROM files f \
             LEFT JOIN links l ON f.link_id = l.id \
             WHERE f.requires_cleanup = FALSE \
             AND (f.workspace_id = $1 OR l.workspace_id = $1)",
        )
        .bind(workspace_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to sum file sizes", e))?;

        sqlx::query("UPDATE workspaces SET storage_used_bytes = $2 WHERE id = $1")
            .bind(workspace_id)
            .bind(actual)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to reconcile counter", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit reconciliation", e)
        })?;

        let correction = actual - recorded;

        if correction != 0 {
            warn!(
                workspace_id = %workspace_id,
                correction_bytes = correction,
                "Usage counter drifted from live file rows"
            );
        }
        Ok(correction)
    }
}
