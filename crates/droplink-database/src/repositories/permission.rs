//! Permission repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_entity::permission::{CreatePermission, Permission, PermissionRole};

/// Repository for per-link permission grants.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the grant for an email on a link, if any.
    pub async fn find_grant(&self, link_id: Uuid, email: &str) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE link_id = $1 AND email = $2",
        )
        .bind(link_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find permission", e))
    }

    /// List all grants on a link, owner first.
    pub async fn list_for_link(&self, link_id: Uuid) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE link_id = $1 \
             ORDER BY (role = 'owner') DESC, created_at ASC",
        )
        .bind(link_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list permissions", e))
    }

    /// Grant a role to an email on a link.
    ///
    /// The single-owner rule lives in the database: attempting to grant
    /// a second owner trips the partial unique index and comes back as a
    /// conflict, same as granting to an email that already holds a role.
    pub async fn grant(&self, data: &CreatePermission) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (link_id, email, role, is_verified) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(data.link_id)
        .bind(&data.email)
        .bind(data.role)
        .bind(data.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some("permissions_one_owner_per_link_key") => {
                        AppError::conflict("Link already has an owner")
                    }
                    _ => AppError::conflict(format!(
                        "'{}' already has a role on this link",
                        data.email
                    )),
                }
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to grant permission", e),
        })
    }

    /// Mark a grant as verified (the email holder proved ownership).
    pub async fn mark_verified(&self, permission_id: Uuid) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "UPDATE permissions SET is_verified = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(permission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to verify permission", e))?
        .ok_or_else(|| AppError::not_found(format!("Permission {permission_id} not found")))
    }

    /// Revoke a non-owner grant on a link. Owner grants can only
    /// disappear with the link itself.
    pub async fn revoke(&self, link_id: Uuid, permission_id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("DELETE FROM permissions WHERE id = $1 AND link_id = $2 AND role <> $3")
                .bind(permission_id)
                .bind(link_id)
                .bind(PermissionRole::Owner)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to revoke permission", e)
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Revocable permission {permission_id} not found"
            )));
        }
        Ok(())
    }

    /// Emails to notify when a batch lands on a link: verified grant
    /// holders with at least editor privileges.
    pub async fn notification_recipients(&self, link_id: Uuid) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT email FROM permissions \
             WHERE link_id = $1 AND is_verified = TRUE AND role IN ('owner', 'editor') \
             ORDER BY email",
        )
        .bind(link_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list recipients", e))
    }
}
