//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use droplink_core::result::AppResult;

use crate::context::Context;
use crate::file::upload_kind::UploadKind;

/// A file stored in Droplink.
///
/// The row carries the same single-context invariant as folders plus the
/// upload-tracking shape constraint; see [`UploadKind`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file name (including extension).
    pub name: String,
    /// File size in bytes.
    pub file_size: i64,
    /// MIME type of the file.
    pub mime_type: Option<String>,
    /// The path within the blob store.
    pub storage_path: String,
    /// The folder containing this file (null = loose at context root).
    pub folder_id: Option<Uuid>,
    /// Owning workspace, for personal and generated-link uploads.
    pub workspace_id: Option<Uuid>,
    /// Owning link, for base/custom link uploads.
    pub link_id: Option<Uuid>,
    /// Upload session batch, for link-delivered files.
    pub batch_id: Option<Uuid>,
    /// Set when the blob was deleted but this row could not be removed;
    /// the cleanup worker sweeps flagged rows.
    pub requires_cleanup: bool,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// The row's upload-tracking shape.
    pub fn upload_kind(&self) -> AppResult<UploadKind> {
        UploadKind::from_columns(self.workspace_id, self.link_id, self.batch_id)
    }

    /// The file's ownership context.
    pub fn context(&self) -> AppResult<Context> {
        Context::from_columns(self.workspace_id, self.link_id)
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The file name.
    pub name: String,
    /// File size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub mime_type: Option<String>,
    /// The path within the blob store.
    pub storage_path: String,
    /// Target folder (None for context root).
    pub folder_id: Option<Uuid>,
    /// The upload-tracking shape.
    pub kind: UploadKind,
}
