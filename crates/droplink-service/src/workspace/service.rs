//! Workspace onboarding.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use droplink_core::config::QuotaConfig;
use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_database::repositories::link::LinkRepository;
use droplink_database::repositories::workspace::WorkspaceRepository;
use droplink_entity::link::{Link, LinkType};
use droplink_entity::workspace::{CreateWorkspace, Workspace};

use crate::context::RequestContext;
use crate::link::service::CreateLinkRequest;
use crate::link::LinkService;

/// Creates workspaces and looks them up for their owners.
#[derive(Debug, Clone)]
pub struct WorkspaceService {
    workspace_repo: Arc<WorkspaceRepository>,
    link_repo: Arc<LinkRepository>,
    link_service: Arc<LinkService>,
    quota_config: QuotaConfig,
}

impl WorkspaceService {
    /// Create a new workspace service.
    pub fn new(
        workspace_repo: Arc<WorkspaceRepository>,
        link_repo: Arc<LinkRepository>,
        link_service: Arc<LinkService>,
        quota_config: QuotaConfig,
    ) -> Self {
        Self {
            workspace_repo,
            link_repo,
            link_service,
            quota_config,
        }
    }

    /// Onboard an owner: create their workspace at the plan default
    /// limit and the base link every workspace starts with.
    pub async fn onboard(&self, ctx: &RequestContext) -> AppResult<(Workspace, Link)> {
        let email = ctx.require_email()?;

        let workspace = self
            .workspace_repo
            .create(&CreateWorkspace {
                owner_email: email.to_string(),
                storage_limit_bytes: self.quota_config.default_limit_bytes,
            })
            .await?;

        let base_link = self
            .link_service
            .create_link_with_root_folder(
                ctx,
                CreateLinkRequest {
                    workspace_id: workspace.id,
                    slug: None,
                    link_type: LinkType::Base,
                    is_public: false,
                    password: None,
                    expires_at: None,
                    notify_on_upload: true,
                    branding: Default::default(),
                    editor_emails: Vec::new(),
                },
            )
            .await?;

        info!(
            workspace_id = %workspace.id,
            owner = email,
            base_link_id = %base_link.id,
            "Onboarded workspace"
        );
        Ok((workspace, base_link))
    }

    /// The caller's own workspace.
    pub async fn find_own(&self, ctx: &RequestContext) -> AppResult<Workspace> {
        let email = ctx.require_email()?;
        self.workspace_repo
            .find_by_owner_email(email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No workspace for '{email}'")))
    }

    /// Get a workspace by id.
    pub async fn get(&self, workspace_id: Uuid) -> AppResult<Workspace> {
        self.workspace_repo
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Workspace {workspace_id} not found")))
    }

    /// Links owned by a workspace.
    pub async fn list_links(&self, workspace_id: Uuid) -> AppResult<Vec<Link>> {
        self.link_repo.find_by_workspace(workspace_id).await
    }

    /// Change a workspace's plan storage limit. Cached quota snapshots
    /// pick the new limit up within the configured staleness window.
    pub async fn change_limit(&self, workspace_id: Uuid, limit_bytes: i64) -> AppResult<Workspace> {
        if limit_bytes <= 0 {
            return Err(AppError::validation("Storage limit must be positive"));
        }
        let workspace = self
            .workspace_repo
            .update_limit(workspace_id, limit_bytes)
            .await?;
        info!(
            workspace_id = %workspace_id,
            limit_bytes,
            "Updated storage limit"
        );
        Ok(workspace)
    }
}
