//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use droplink_core::AppResult;
use droplink_entity::link::{Link, LinkType};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Detailed health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database connectivity.
    pub database: String,
    /// Blob store connectivity.
    pub storage: String,
    /// Blob provider in use.
    pub storage_provider: String,
}

/// Public view of a link, stripped of its configuration internals.
///
/// This is what an anonymous uploader resolving a slug sees; the
/// password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicLinkResponse {
    /// Public slug.
    pub slug: String,
    /// Link kind.
    pub link_type: LinkType,
    /// Whether the link is currently accepting uploads.
    pub accepting_uploads: bool,
    /// Whether a password must be verified before uploading.
    pub requires_password: bool,
    /// When the link stops accepting uploads, if set.
    pub expires_at: Option<DateTime<Utc>>,
    /// Presentation branding.
    pub branding: serde_json::Value,
}

impl PublicLinkResponse {
    /// Build the public view from a link row.
    pub fn from_link(link: &Link) -> AppResult<Self> {
        let config = link.config()?;
        Ok(Self {
            slug: link.slug.clone(),
            link_type: link.link_type,
            accepting_uploads: link.is_active && !config.is_expired(Utc::now()),
            requires_password: config.is_password_protected(),
            expires_at: config.expires_at,
            branding: link.branding.clone(),
        })
    }
}

/// Outcome of a bulk delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    /// Files whose blob and row are both gone (or the row is flagged
    /// for cleanup).
    pub deleted_count: u64,
    /// Files left fully intact because their blob delete failed.
    pub failed_ids: Vec<Uuid>,
}

/// Outcome of a folder delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderDeleteResponse {
    /// Files detached from the deleted subtree; their blobs are kept.
    pub detached_count: u64,
}
