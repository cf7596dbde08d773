//! Link lifecycle service.
//!
//! Creation paths delegate the multi-row atomic unit to the repository;
//! this layer handles ownership checks, slug selection, password
//! hashing, and the fire-and-forget editor notifications that must
//! never roll anything back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::traits::Notification;
use droplink_database::repositories::folder::FolderRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_database::repositories::workspace::WorkspaceRepository;
use droplink_entity::link::{Branding, CreateLink, Link, LinkConfig, LinkType};
use droplink_entity::workspace::Workspace;

use crate::context::RequestContext;
use crate::notify::NotificationDispatcher;

use super::password::{self, LinkPasswordHasher};
use super::slug;

/// Request to create a base or custom link.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateLinkRequest {
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Caller-chosen slug; a random one is generated when absent.
    pub slug: Option<String>,
    /// The link kind (base or custom; generated links come from
    /// folder sharing).
    pub link_type: LinkType,
    /// Whether the link is listed publicly.
    #[serde(default)]
    pub is_public: bool,
    /// Plaintext password to protect the link with, if any.
    pub password: Option<String>,
    /// When the link stops accepting uploads.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the owner is notified after each completed batch.
    #[serde(default)]
    pub notify_on_upload: bool,
    /// Presentation branding.
    #[serde(default)]
    pub branding: Branding,
    /// Emails granted editor access alongside the owner.
    #[serde(default)]
    pub editor_emails: Vec<String>,
}

/// Manages link creation, folder sharing, deactivation, and removal.
#[derive(Debug, Clone)]
pub struct LinkService {
    link_repo: Arc<LinkRepository>,
    folder_repo: Arc<FolderRepository>,
    workspace_repo: Arc<WorkspaceRepository>,
    hasher: LinkPasswordHasher,
    notifications: NotificationDispatcher,
}

impl LinkService {
    /// Create a new link service.
    pub fn new(
        link_repo: Arc<LinkRepository>,
        folder_repo: Arc<FolderRepository>,
        workspace_repo: Arc<WorkspaceRepository>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            link_repo,
            folder_repo,
            workspace_repo,
            hasher: LinkPasswordHasher::new(),
            notifications,
        }
    }

    /// Find a link by its public slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Link>> {
        self.link_repo.find_by_slug(slug).await
    }

    /// UX pre-check for slug availability. The authoritative answer
    /// comes from the unique constraint at creation time.
    pub async fn slug_available(&self, candidate: &str) -> AppResult<bool> {
        slug::validate_slug(candidate)?;
        self.link_repo.slug_available(candidate).await
    }

    /// Create a link with its owner permission, editor permissions, and
    /// root folder — atomically.
    ///
    /// A slug claimed between the pre-check and the insert surfaces as a
    /// conflict; the caller picks a new slug, nothing is retried here.
    pub async fn create_link_with_root_folder(
        &self,
        ctx: &RequestContext,
        req: CreateLinkRequest,
    ) -> AppResult<Link> {
        let workspace = self.require_owned_workspace(ctx, req.workspace_id).await?;

        if req.link_type == LinkType::Generated {
            return Err(AppError::validation(
                "Generated links are created by sharing a folder",
            ));
        }

        let chosen_slug = match req.slug {
            Some(s) => {
                slug::validate_slug(&s)?;
                if !self.link_repo.slug_available(&s).await? {
                    return Err(AppError::conflict(format!("Slug '{s}' is already taken")));
                }
                s
            }
            None => slug::random_slug(),
        };

        let password_hash = match &req.password {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };
        let link_config = LinkConfig {
            expires_at: req.expires_at,
            password_hash,
            notify_on_upload: req.notify_on_upload,
        };

        let data = CreateLink {
            workspace_id: workspace.id,
            slug: chosen_slug,
            link_type: req.link_type,
            is_public: req.is_public,
            link_config: serde_json::to_value(&link_config)?,
            branding: serde_json::to_value(&req.branding)?,
            source_folder_id: None,
        };

        let (link, root_folder) = self
            .link_repo
            .create_with_owner(&data, &workspace.owner_email, &req.editor_emails, "Uploads")
            .await?;

        info!(
            link_id = %link.id,
            slug = %link.slug,
            link_type = %link.link_type,
            root_folder_id = %root_folder.id,
            "Created link"
        );

        self.notify_editors(&link, &req.editor_emails);
        Ok(link)
    }

    /// Share an existing workspace folder through a generated link.
    ///
    /// With `existing_link_id` set, the folder is attached to that
    /// (inactive) generated link; otherwise a new generated link named
    /// after the folder is created in the same transaction as its
    /// permissions.
    pub async fn link_existing_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        existing_link_id: Option<Uuid>,
        editor_emails: &[String],
    ) -> AppResult<Link> {
        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        // Only workspace folders can be shared; link folders already
        // belong to a link.
        let workspace_id = folder.workspace_id.ok_or_else(|| {
            AppError::validation("Only workspace folders can be shared through a generated link")
        })?;
        let workspace = self.require_owned_workspace(ctx, workspace_id).await?;

        let link = match existing_link_id {
            Some(link_id) => self.link_repo.attach_folder(link_id, folder_id).await?,
            None => {
                let data = CreateLink {
                    workspace_id: workspace.id,
                    slug: slug::slug_from_name(&folder.name),
                    link_type: LinkType::Generated,
                    is_public: false,
                    link_config: serde_json::to_value(LinkConfig::default())?,
                    branding: serde_json::to_value(Branding::default())?,
                    source_folder_id: Some(folder_id),
                };
                self.link_repo
                    .create_for_folder(&data, &workspace.owner_email, editor_emails)
                    .await?
            }
        };

        info!(
            link_id = %link.id,
            slug = %link.slug,
            folder_id = %folder_id,
            "Shared folder through generated link"
        );

        self.notify_editors(&link, editor_emails);
        Ok(link)
    }

    /// Verify a password attempt against a protected link.
    ///
    /// Links without a password accept any attempt.
    pub fn verify_password(&self, link: &Link, attempt: &str) -> AppResult<bool> {
        let config = link.config()?;
        match config.password_hash {
            Some(ref hash) => self.hasher.verify(attempt, hash),
            None => Ok(true),
        }
    }

    /// Require a valid password before a protected link admits an
    /// upload batch. Open links admit anything.
    pub fn require_password(&self, link: &Link, attempt: Option<&str>) -> AppResult<()> {
        password::admit_attempt(&self.hasher, &link.config()?, attempt)
    }

    /// Deactivate a link. Content stays in place; uploads stop.
    pub async fn deactivate(&self, ctx: &RequestContext, link_id: Uuid) -> AppResult<Link> {
        self.require_link_ownership(ctx, link_id).await?;
        let link = self.link_repo.deactivate(link_id).await?;
        info!(link_id = %link_id, "Deactivated link");
        Ok(link)
    }

    /// Remove a link permanently. Its folders and files are re-homed
    /// into the owning workspace; nothing the uploaders deposited is
    /// lost.
    pub async fn remove(&self, ctx: &RequestContext, link_id: Uuid) -> AppResult<()> {
        self.require_link_ownership(ctx, link_id).await?;
        self.link_repo.remove(link_id).await?;
        info!(link_id = %link_id, "Removed link");
        Ok(())
    }

    /// Load a workspace and require the caller to own it.
    async fn require_owned_workspace(
        &self,
        ctx: &RequestContext,
        workspace_id: Uuid,
    ) -> AppResult<Workspace> {
        let email = ctx.require_email()?;
        let workspace = self
            .workspace_repo
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Workspace {workspace_id} not found")))?;
        if workspace.owner_email != email {
            return Err(AppError::forbidden("Workspace belongs to another owner"));
        }
        Ok(workspace)
    }

    /// Require the caller to own the workspace behind a link.
    async fn require_link_ownership(
        &self,
        ctx: &RequestContext,
        link_id: Uuid,
    ) -> AppResult<Link> {
        let link = self
            .link_repo
            .find_by_id(link_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Link {link_id} not found")))?;
        self.require_owned_workspace(ctx, link.workspace_id).await?;
        Ok(link)
    }

    fn notify_editors(&self, link: &Link, editor_emails: &[String]) {
        for email in editor_emails {
            self.notifications.fire_and_forget(Notification {
                recipient: email.clone(),
                event: "permission_granted".to_string(),
                payload: json!({
                    "link_id": link.id,
                    "slug": link.slug,
                    "role": "editor",
                }),
            });
        }
    }
}
