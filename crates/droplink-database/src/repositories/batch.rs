//! Batch repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_entity::batch::{Batch, CreateBatch};

/// Repository for upload-session batches.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: PgPool,
}

impl BatchRepository {
    /// Create a new batch repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a batch by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Batch>> {
        sqlx::query_as::<_, Batch>("SELECT * FROM batches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find batch", e))
    }

    /// Open a batch for an external upload session. The target-folder
    /// rule (set iff the link is generated) is enforced by the database;
    /// a violation surfaces as a validation error.
    pub async fn create(&self, data: &CreateBatch) -> AppResult<Batch> {
        sqlx::query_as::<_, Batch>(
            "INSERT INTO batches (link_id, uploader_name, uploader_email, target_folder_id) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(data.link_id)
        .bind(&data.uploader_name)
        .bind(&data.uploader_email)
        .bind(data.target_folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("23514") => {
                AppError::validation("Batch target folder does not match the link type")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create batch", e),
        })
    }

    /// List batches received through a link, newest first.
    pub async fn list_for_link(&self, link_id: Uuid) -> AppResult<Vec<Batch>> {
        sqlx::query_as::<_, Batch>(
            "SELECT * FROM batches WHERE link_id = $1 ORDER BY created_at DESC",
        )
        .bind(link_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list batches", e))
    }
}
