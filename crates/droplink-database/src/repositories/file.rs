//! File repository implementation.
//!
//! The name-availability query here is the database half of the
//! dual-layer reservation protocol; the blob-store half lives with the
//! storage providers.

use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_core::types::{PageRequest, PageResponse};
use droplink_entity::Context;
use droplink_entity::file::{CreateFile, File};

/// Repository for file rows.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Insert a file row. The context and batch columns come from the
    /// validated [`UploadKind`](droplink_entity::UploadKind), so only
    /// the three legal shapes ever reach the database.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        let (workspace_id, link_id, batch_id) = data.kind.into_columns();

        sqlx::query_as::<_, File>(
            "INSERT INTO files \
             (name, file_size, mime_type, storage_path, folder_id, workspace_id, link_id, batch_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&data.name)
        .bind(data.file_size)
        .bind(&data.mime_type)
        .bind(&data.storage_path)
        .bind(data.folder_id)
        .bind(workspace_id)
        .bind(link_id)
        .bind(batch_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("files_folder_name_key") =>
            {
                AppError::conflict(format!("A file named '{}' already exists here", data.name))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
        })
    }

    /// Whether a name is already taken at a location: inside a folder
    /// when `folder_id` is set, otherwise among the loose files of the
    /// given context.
    pub async fn name_exists(
        &self,
        folder_id: Option<Uuid>,
        context: Context,
        name: &str,
    ) -> AppResult<bool> {
        let exists: bool = match folder_id {
            Some(folder_id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM files WHERE folder_id = $1 AND name = $2)",
                )
                .bind(folder_id)
                .bind(name)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                let (workspace_id, link_id) = context.into_columns();
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM files \
                     WHERE folder_id IS NULL AND name = $1 \
                     AND workspace_id IS NOT DISTINCT FROM $2 \
                     AND link_id IS NOT DISTINCT FROM $3)",
                )
                .bind(name)
                .bind(workspace_id)
                .bind(link_id)
                .fetch_one(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check file name", e))?;
        Ok(exists)
    }

    /// Files directly inside a folder, paginated, newest first.
    pub async fn list_by_folder(
        &self,
        folder_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = $1")
            .bind(folder_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;

        let items = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(folder_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        Ok(PageResponse::new(
            items,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Files in a batch.
    pub async fn list_by_batch(&self, batch_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE batch_id = $1 ORDER BY created_at ASC",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list batch files", e))
    }

    /// All files within a folder subtree (the folder itself and every
    /// descendant). Used by folder deletion to remove blobs first.
    pub async fn list_in_subtree(&self, folder_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "WITH RECURSIVE subtree AS ( \
                 SELECT id FROM folders WHERE id = $1 \
                 UNION ALL \
                 SELECT f.id FROM folders f \
                 JOIN subtree s ON f.parent_folder_id = s.id \
             ) \
             SELECT files.* FROM files \
             JOIN subtree ON files.folder_id = subtree.id",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list subtree files", e))
    }

    /// Delete a file row. Returns `false` if the row was already gone.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete many file rows at once; returns how many actually went.
    pub async fn delete_many(&self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM files WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete files", e))?;
        Ok(result.rows_affected())
    }

    /// Flag a row whose blob is gone but whose delete failed, so the
    /// cleanup worker retries it.
    pub async fn mark_requires_cleanup(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE files SET requires_cleanup = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to flag file for cleanup", e)
            })?;
        Ok(())
    }

    /// Rows flagged for cleanup, oldest first.
    pub async fn find_requiring_cleanup(&self, limit: i64) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE requires_cleanup = TRUE \
             ORDER BY updated_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list cleanup candidates", e)
        })
    }
}
