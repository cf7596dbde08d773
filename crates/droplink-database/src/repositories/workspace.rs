//! Workspace repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_entity::workspace::{CreateWorkspace, Workspace};

/// Repository for workspace rows.
#[derive(Debug, Clone)]
pub struct WorkspaceRepository {
    pool: PgPool,
}

impl WorkspaceRepository {
    /// Create a new workspace repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a workspace by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find workspace", e))
    }

    /// Find a workspace by its owner's email.
    pub async fn find_by_owner_email(&self, email: &str) -> AppResult<Option<Workspace>> {
        sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE owner_email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find workspace by owner", e)
            })
    }

    /// Create a workspace at onboarding.
    pub async fn create(&self, data: &CreateWorkspace) -> AppResult<Workspace> {
        sqlx::query_as::<_, Workspace>(
            "INSERT INTO workspaces (owner_email, storage_limit_bytes) \
             VALUES ($1, $2) RETURNING *",
        )
        .bind(&data.owner_email)
        .bind(data.storage_limit_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!(
                    "A workspace for '{}' already exists",
                    data.owner_email
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create workspace", e),
        })
    }

    /// Update the plan storage limit.
    pub async fn update_limit(&self, id: Uuid, limit_bytes: i64) -> AppResult<Workspace> {
        sqlx::query_as::<_, Workspace>(
            "UPDATE workspaces SET storage_limit_bytes = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(limit_bytes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update limit", e))?
        .ok_or_else(|| AppError::not_found(format!("Workspace {id} not found")))
    }

    /// List all workspace ids (used by counter reconciliation).
    pub async fn all_ids(&self) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM workspaces")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list workspaces", e))
    }
}
