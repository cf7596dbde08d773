//! Batch entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Groups the files deposited during one external upload session.
///
/// The target folder is constrained by the link type: null for base and
/// custom links, equal to the link's source folder for generated links.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: Uuid,
    /// The link the batch arrived through.
    pub link_id: Uuid,
    /// Name provided by the uploader.
    pub uploader_name: String,
    /// Email provided by the uploader, if any.
    pub uploader_email: Option<String>,
    /// Destination folder (generated links only).
    pub target_folder_id: Option<Uuid>,
    /// When the batch was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatch {
    /// The link the batch arrives through.
    pub link_id: Uuid,
    /// Name provided by the uploader.
    pub uploader_name: String,
    /// Email provided by the uploader, if any.
    pub uploader_email: Option<String>,
    /// Destination folder (generated links only).
    pub target_folder_id: Option<Uuid>,
}
