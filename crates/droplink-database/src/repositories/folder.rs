//! Folder repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_entity::folder::{CreateFolder, Folder};

/// Repository for folder rows.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Create a folder. Context columns come from the validated
    /// [`Context`](droplink_entity::Context), so exactly one of
    /// `workspace_id` / `link_id` is set.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let (workspace_id, link_id) = data.context.into_columns();

        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (name, parent_folder_id, workspace_id, link_id) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&data.name)
        .bind(data.parent_folder_id)
        .bind(workspace_id)
        .bind(link_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))
    }

    /// The root folder of a link (no parent, link context).
    pub async fn find_root_for_link(&self, link_id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE link_id = $1 AND parent_folder_id IS NULL \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(link_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find root folder", e))
    }

    /// Direct children of a folder.
    pub async fn list_children(&self, parent_folder_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE parent_folder_id = $1 ORDER BY name ASC",
        )
        .bind(parent_folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// Top-level folders of a workspace.
    pub async fn list_workspace_roots(&self, workspace_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE workspace_id = $1 AND parent_folder_id IS NULL \
             ORDER BY name ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// Rename a folder.
    pub async fn rename(&self, id: Uuid, name: &str) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>("UPDATE folders SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename folder", e))?
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    /// Delete a folder row. Child folders cascade; contained files are
    /// detached (folder FK is SET NULL) and keep their blobs. Returns
    /// `false` if the row was already gone.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete folder", e))?;
        Ok(result.rows_affected() > 0)
    }
}
