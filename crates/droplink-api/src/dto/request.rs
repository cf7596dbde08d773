//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use droplink_entity::link::{Branding, LinkType};

/// Create link request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLinkBody {
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Caller-chosen slug; random when absent.
    #[validate(length(min = 1, max = 64))]
    pub slug: Option<String>,
    /// Link kind: `"base"` or `"custom"`.
    pub link_type: LinkType,
    /// Whether the link is listed publicly.
    #[serde(default)]
    pub is_public: bool,
    /// Plaintext password to protect the link with.
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

/// Share-folder request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareFolderBody {
    /// The workspace folder to share.
    pub folder_id: Uuid,
    /// Attach to this existing generated link instead of creating one.
    pub existing_link_id: Option<Uuid>,
    /// Emails granted editor access.
    #[serde(default)]
    pub editor_emails: Vec<String>,
}

/// Link password verification body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyPasswordBody {
    /// Password attempt.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Open-batch request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpenBatchBody {
    /// Display name of the external uploader.
    #[validate(length(min = 1, max = 200))]
    pub uploader_name: String,
    /// Optional contact email of the uploader.
    pub uploader_email: Option<String>,
    /// Password for protected links.
    pub password: Option<String>,
}

/// Resumable upload initiation body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InitiateUploadBody {
    /// Desired file name.
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    /// Total file size in bytes.
    pub file_size: u64,
    /// MIME type, if known.
    pub mime_type: Option<String>,
}

/// Create folder request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolderBody {
    /// Folder name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Parent folder, if not a root.
    pub parent_folder_id: Option<Uuid>,
    /// Workspace scope (exactly one of workspace_id/link_id).
    pub workspace_id: Option<Uuid>,
    /// Link scope (exactly one of workspace_id/link_id).
    pub link_id: Option<Uuid>,
}

/// Rename folder request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameFolderBody {
    /// New folder name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Editor invitation body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InviteEditorBody {
    /// Email to grant editor access to.
    #[validate(email)]
    pub email: String,
}

/// Storage limit update body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateLimitBody {
    /// New plan limit in bytes.
    #[validate(range(min = 1))]
    pub storage_limit_bytes: i64,
}

/// Bulk delete request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkDeleteBody {
    /// Files to delete.
    #[validate(length(min = 1, max = 500))]
    pub file_ids: Vec<Uuid>,
}
