//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use droplink_core::result::AppResult;

use crate::context::Context;

/// A folder in the hierarchy.
///
/// Exactly one of `workspace_id`/`link_id` is set (the single-context
/// invariant), and a child folder always shares its parent's context.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// Folder name.
    pub name: String,
    /// Parent folder ID (null for root folders).
    pub parent_folder_id: Option<Uuid>,
    /// Owning workspace, for personal folders.
    pub workspace_id: Option<Uuid>,
    /// Owning link, for shared folders.
    pub link_id: Option<Uuid>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_folder_id.is_none()
    }

    /// The folder's ownership context.
    pub fn context(&self) -> AppResult<Context> {
        Context::from_columns(self.workspace_id, self.link_id)
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Folder name.
    pub name: String,
    /// Parent folder (None for root).
    pub parent_folder_id: Option<Uuid>,
    /// The ownership context.
    pub context: Context,
}
