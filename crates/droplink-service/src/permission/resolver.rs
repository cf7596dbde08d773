//! Resolves which {role, email} pairs may act on a link.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_database::repositories::permission::PermissionRepository;
use droplink_entity::permission::{CreatePermission, Permission, PermissionRole};

use crate::context::RequestContext;

/// Resolves the grants on a link and enforces role requirements.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    permission_repo: Arc<PermissionRepository>,
}

impl PermissionResolver {
    /// Create a new resolver.
    pub fn new(permission_repo: Arc<PermissionRepository>) -> Self {
        Self { permission_repo }
    }

    /// All grants on a link, owner first.
    pub async fn resolve(&self, link_id: Uuid) -> AppResult<Vec<Permission>> {
        self.permission_repo.list_for_link(link_id).await
    }

    /// The caller's grant on a link, if any.
    pub async fn grant_for(
        &self,
        ctx: &RequestContext,
        link_id: Uuid,
    ) -> AppResult<Option<Permission>> {
        let Some(email) = ctx.principal_email.as_deref() else {
            return Ok(None);
        };
        self.permission_repo.find_grant(link_id, email).await
    }

    /// Require the caller to hold at least `min_role` on the link.
    ///
    /// Roles above uploader must additionally be verified; an unverified
    /// editor grant confers nothing yet.
    pub async fn require_role(
        &self,
        ctx: &RequestContext,
        link_id: Uuid,
        min_role: PermissionRole,
    ) -> AppResult<Permission> {
        let email = ctx.require_email()?;
        let grant = self
            .permission_repo
            .find_grant(link_id, email)
            .await?
            .ok_or_else(|| AppError::forbidden(format!("No grant on link for '{email}'")))?;

        if !grant.role.has_at_least(&min_role) {
            debug!(
                link_id = %link_id,
                email,
                held = grant.role.as_str(),
                required = min_role.as_str(),
                "Role requirement not met"
            );
            return Err(AppError::forbidden(format!(
                "Requires at least {} on this link",
                min_role.as_str()
            )));
        }
        if !grant.is_verified && grant.role.has_at_least(&PermissionRole::Editor) {
            return Err(AppError::forbidden(
                "Grant is not verified yet; confirm the invitation first",
            ));
        }
        Ok(grant)
    }

    /// Invite an editor onto a link. Only the link owner may invite.
    ///
    /// The grant starts unverified and confers nothing until the invitee
    /// confirms it with [`confirm_grant`](Self::confirm_grant).
    pub async fn invite_editor(
        &self,
        ctx: &RequestContext,
        link_id: Uuid,
        email: &str,
    ) -> AppResult<Permission> {
        self.require_role(ctx, link_id, PermissionRole::Owner)
            .await?;
        let grant = self
            .permission_repo
            .grant(&CreatePermission {
                link_id,
                email: email.to_string(),
                role: PermissionRole::Editor,
                is_verified: false,
            })
            .await?;
        debug!(link_id = %link_id, email, "Invited editor");
        Ok(grant)
    }

    /// Confirm the caller's own grant on a link. Idempotent: confirming
    /// an already-verified grant returns it unchanged.
    pub async fn confirm_grant(&self, ctx: &RequestContext, link_id: Uuid) -> AppResult<Permission> {
        let email = ctx.require_email()?;
        let grant = self
            .permission_repo
            .find_grant(link_id, email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No grant on link for '{email}'")))?;
        if grant.is_verified {
            return Ok(grant);
        }
        self.permission_repo.mark_verified(grant.id).await
    }

    /// Revoke a non-owner grant on a link. Only the link owner may
    /// revoke; the owner grant itself cannot be revoked.
    pub async fn revoke_grant(
        &self,
        ctx: &RequestContext,
        link_id: Uuid,
        permission_id: Uuid,
    ) -> AppResult<()> {
        self.require_role(ctx, link_id, PermissionRole::Owner)
            .await?;
        self.permission_repo.revoke(link_id, permission_id).await
    }
}
