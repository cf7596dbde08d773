//! Link repository — queries plus the transactional creation paths.
//!
//! Creating a link is a multi-row operation: the link row, its owner
//! permission, any pre-authorized editor permissions, and a root folder
//! must appear together or not at all. Both creation paths here run in a
//! single transaction so no reader ever observes a link without its
//! owner permission.
//!
//! Slug races are detected at insert time through the database's unique
//! constraint: the error is matched structurally
//! (`DatabaseError::is_unique_violation` + the constraint name), never
//! by message text, and surfaced as a plain conflict for the caller.

use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_entity::folder::Folder;
use droplink_entity::link::{CreateLink, Link, LinkType};
use droplink_entity::permission::PermissionRole;

/// Constraint name backing the global slug uniqueness rule.
const SLUG_CONSTRAINT: &str = "links_slug_key";
/// Partial index enforcing one generated link per source folder.
const GENERATED_SOURCE_CONSTRAINT: &str = "links_generated_source_folder_key";

/// Repository for link rows and the atomic creation units around them.
#[derive(Debug, Clone)]
pub struct LinkRepository {
    pool: PgPool,
}

impl LinkRepository {
    /// Create a new link repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a link by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Link>> {
        sqlx::query_as::<_, Link>("SELECT * FROM links WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find link", e))
    }

    /// Find a link by its slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Link>> {
        sqlx::query_as::<_, Link>("SELECT * FROM links WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find link by slug", e)
            })
    }

    /// Optimistic slug availability pre-check.
    ///
    /// UX only: the authoritative check is the unique constraint at
    /// insert time.
    pub async fn slug_available(&self, slug: &str) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check slug availability", e)
            })?;
        Ok(!taken)
    }

    /// List links owned by a workspace.
    pub async fn find_by_workspace(&self, workspace_id: Uuid) -> AppResult<Vec<Link>> {
        sqlx::query_as::<_, Link>(
            "SELECT * FROM links WHERE workspace_id = $1 ORDER BY created_at DESC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list links", e))
    }

    /// Create a link together with its owner permission, pre-authorized
    /// editor permissions, and a root folder — one transaction.
    ///
    /// Returns `Conflict` if the slug was claimed between any pre-check
    /// and the insert. The transaction rolls back on every failure path;
    /// a partial link/permission/folder triple is never observable.
    pub async fn create_with_owner(
        &self,
        data: &CreateLink,
        owner_email: &str,
        editor_emails: &[String],
        root_folder_name: &str,
    ) -> AppResult<(Link, Folder)> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let link = sqlx::query_as::<_, Link>(
            "INSERT INTO links \
             (workspace_id, slug, link_type, is_public, link_config, branding, source_folder_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.workspace_id)
        .bind(&data.slug)
        .bind(data.link_type)
        .bind(data.is_public)
        .bind(&data.link_config)
        .bind(&data.branding)
        .bind(data.source_folder_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_link_insert_error(e, &data.slug))?;

        sqlx::query(
            "INSERT INTO permissions (link_id, email, role, is_verified) \
             VALUES ($1, $2, $3, TRUE)",
        )
        .bind(link.id)
        .bind(owner_email)
        .bind(PermissionRole::Owner)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create owner permission", e)
        })?;

        for email in editor_emails {
            sqlx::query(
                "INSERT INTO permissions (link_id, email, role, is_verified) \
                 VALUES ($1, $2, $3, FALSE)",
            )
            .bind(link.id)
            .bind(email)
            .bind(PermissionRole::Editor)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to create editor permission", e)
            })?;
        }

        let folder = sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (name, parent_folder_id, workspace_id, link_id) \
             VALUES ($1, NULL, NULL, $2) RETURNING *",
        )
        .bind(root_folder_name)
        .bind(link.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create root folder", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit link creation", e)
        })?;

        Ok((link, folder))
    }

    /// Create a generated link sharing an existing workspace folder,
    /// with its owner and editor permissions — one transaction.
    ///
    /// Unlike [`create_with_owner`], no root folder is inserted; the
    /// shared folder stays in the workspace and the link references it
    /// through `source_folder_id`.
    ///
    /// [`create_with_owner`]: Self::create_with_owner
    pub async fn create_for_folder(
        &self,
        data: &CreateLink,
        owner_email: &str,
        editor_emails: &[String],
    ) -> AppResult<Link> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let link = sqlx::query_as::<_, Link>(
            "INSERT INTO links \
             (workspace_id, slug, link_type, is_public, link_config, branding, source_folder_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(data.workspace_id)
        .bind(&data.slug)
        .bind(data.link_type)
        .bind(data.is_public)
        .bind(&data.link_config)
        .bind(&data.branding)
        .bind(data.source_folder_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_link_insert_error(e, &data.slug))?;

        sqlx::query(
            "INSERT INTO permissions (link_id, email, role, is_verified) \
             VALUES ($1, $2, $3, TRUE)",
        )
        .bind(link.id)
        .bind(owner_email)
        .bind(PermissionRole::Owner)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create owner permission", e)
        })?;

        for email in editor_emails {
            sqlx::query(
                "INSERT INTO permissions (link_id, email, role, is_verified) \
                 VALUES ($1, $2, $3, FALSE)",
            )
            .bind(link.id)
            .bind(email)
            .bind(PermissionRole::Editor)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to create editor permission", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit link creation", e)
        })?;

        Ok(link)
    }

    /// Point an existing generated link at a workspace folder.
    pub async fn attach_folder(&self, link_id: Uuid, folder_id: Uuid) -> AppResult<Link> {
        sqlx::query_as::<_, Link>(
            "UPDATE links SET source_folder_id = $2, is_active = TRUE \
             WHERE id = $1 AND link_type = $3 RETURNING *",
        )
        .bind(link_id)
        .bind(folder_id)
        .bind(LinkType::Generated)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(GENERATED_SOURCE_CONSTRAINT) =>
            {
                AppError::conflict("Folder is already shared through another generated link")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to attach folder", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("Generated link {link_id} not found")))
    }

    /// Deactivate a link (stops accepting uploads; nothing is deleted).
    pub async fn deactivate(&self, link_id: Uuid) -> AppResult<Link> {
        sqlx::query_as::<_, Link>(
            "UPDATE links SET is_active = FALSE WHERE id = $1 RETURNING *",
        )
        .bind(link_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate link", e))?
        .ok_or_else(|| AppError::not_found(format!("Link {link_id} not found")))
    }

    /// Remove a link for good. Its folders and files survive: they are
    /// re-homed into the owning workspace in the same transaction (the
    /// only assignment that keeps the single-context invariant intact).
    pub async fn remove(&self, link_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let workspace_id: Option<Uuid> =
            sqlx::query_scalar("SELECT workspace_id FROM links WHERE id = $1")
                .bind(link_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to load link", e)
                })?;
        let workspace_id =
            workspace_id.ok_or_else(|| AppError::not_found(format!("Link {link_id} not found")))?;

        sqlx::query("UPDATE folders SET workspace_id = $2, link_id = NULL WHERE link_id = $1")
            .bind(link_id)
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to re-home link folders", e)
            })?;

        sqlx::query("UPDATE files SET workspace_id = $2, link_id = NULL WHERE link_id = $1")
            .bind(link_id)
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to re-home link files", e)
            })?;

        // Permissions and batches cascade; the batch FK on re-homed
        // file rows nulls out, leaving them in the personal shape.
        sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(link_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete link", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit link removal", e)
        })?;

        Ok(())
    }
}

/// Map a link insert failure, turning the slug unique violation into the
/// conflict the caller is expected to handle.
fn map_link_insert_error(e: sqlx::Error, slug: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err)
            if db_err.is_unique_violation() && db_err.constraint() == Some(SLUG_CONSTRAINT) =>
        {
            AppError::conflict(format!("Slug '{slug}' is already taken"))
        }
        sqlx::Error::Database(ref db_err)
            if db_err.is_unique_violation()
                && db_err.constraint() == Some(GENERATED_SOURCE_CONSTRAINT) =>
        {
            AppError::conflict("Folder is already shared through another generated link")
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to create link", e),
    }
}
