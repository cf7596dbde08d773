//! Blob store trait for pluggable storage backends.
//!
//! The blob store is treated as non-transactional: nothing guarantees it
//! agrees with the database at any instant. Every protocol built on top
//! of this trait (upload reservation, deletion ordering) exists because
//! of that property.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use uuid::Uuid;

use crate::result::AppResult;

/// Metadata about a stored blob.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BlobMeta {
    /// Path within the blob store.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// A byte stream type used for reading blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// State of a resumable upload session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadSession {
    /// Session identifier.
    pub id: Uuid,
    /// Final destination path reserved by this session.
    pub destination: String,
    /// Total expected size in bytes.
    pub expected_bytes: u64,
    /// Bytes received so far.
    pub received_bytes: u64,
    /// When the session expires if not completed.
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for blob storage backends.
///
/// Implementations exist for the local filesystem and an in-memory store.
/// The trait is defined here in `droplink-core` and implemented in
/// `droplink-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write bytes to a blob at the given path.
    async fn put(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Read a blob into memory as a complete byte vector.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Read a blob and return its byte stream.
    async fn read(&self, path: &str) -> AppResult<ByteStream>;

    /// Check whether a blob exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Delete a blob at the given path.
    ///
    /// Deleting an absent blob is success: the deletion protocol retries
    /// the same file id and must not fail on the second pass.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Get metadata about a blob.
    async fn metadata(&self, path: &str) -> AppResult<BlobMeta>;

    /// Initiate a resumable upload session targeting `destination`.
    ///
    /// Implementations must leave a visible reservation at the
    /// destination (the dual-layer name check relies on it to see
    /// abandoned sessions).
    async fn initiate_session(
        &self,
        destination: &str,
        expected_bytes: u64,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<UploadSession>;

    /// Append a chunk to an open session.
    async fn upload_chunk(&self, session_id: Uuid, chunk_index: u32, data: Bytes)
    -> AppResult<()>;

    /// Verify a session is complete and publish the blob at its
    /// destination. Returns the final blob metadata.
    async fn verify_session(&self, session_id: Uuid) -> AppResult<BlobMeta>;

    /// Abort a session, releasing its destination reservation.
    async fn abort_session(&self, session_id: Uuid) -> AppResult<()>;

    /// Whether a destination path is reserved by any open session.
    async fn session_reserved(&self, destination: &str) -> AppResult<bool>;

    /// Abort every session past its expiry, releasing reservations and
    /// partial data. Returns how many sessions were swept.
    async fn sweep_expired_sessions(&self) -> AppResult<u32>;
}
