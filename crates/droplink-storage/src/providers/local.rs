//! Local filesystem blob store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_core::traits::{BlobMeta, BlobStore, ByteStream, UploadSession};

use crate::resumable::{self, SessionRegistry};

/// Blob store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
    sessions: Arc<SessionRegistry>,
}

impl LocalBlobStore {
    /// Create a new local blob store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            sessions: Arc::new(SessionRegistry::new()),
        })
    }

    /// Resolve a relative path to an absolute path within the root.
    ///
    /// Every component must stay inside the root: `..` segments and
    /// backslashes are rejected rather than normalized.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let mut full = self.root.clone();
        for component in path.split('/') {
            match component {
                "" | "." => continue,
                ".." => {
                    return Err(AppError::validation(format!(
                        "Blob path escapes the storage root: {path}"
                    )));
                }
                c if c.contains('\\') => {
                    return Err(AppError::validation(format!(
                        "Blob path contains an invalid component: {path}"
                    )));
                }
                c => full.push(c),
            }
        }
        Ok(full)
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Remove a session's chunks and destination marker. Best effort:
    /// missing pieces are fine.
    async fn discard_session_data(&self, session_id: Uuid, destination: &str) {
        if let Ok(chunk_dir) = self.resolve(&format!("_sessions/{session_id}")) {
            let _ = fs::remove_dir_all(&chunk_dir).await;
        }
        if let Ok(marker) = self.resolve(&resumable::reservation_path(destination)) {
            let _ = fs::remove_file(&marker).await;
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn put(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write blob: {path}"), e)
        })?;

        debug!(path, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read blob: {path}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(path)?;
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open blob: {path}"),
                    e,
                )
            }
        })?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(|b| b.into()))))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.resolve(path)?.exists())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            // Absent blob: the deletion protocol may retry a file whose
            // blob already went.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete blob: {path}"),
                e,
            )),
        }
    }

    async fn metadata(&self, path: &str) -> AppResult<BlobMeta> {
        let full_path = self.resolve(path)?;
        let meta = fs::metadata(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to get metadata: {path}"),
                    e,
                )
            }
        })?;

        let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);

        Ok(BlobMeta {
            path: path.to_string(),
            size_bytes: meta.len(),
            last_modified,
        })
    }

    async fn initiate_session(
        &self,
        destination: &str,
        expected_bytes: u64,
        expires_at: DateTime<Utc>,
    ) -> AppResult<UploadSession> {
        if self.session_reserved(destination).await? {
            return Err(AppError::conflict(format!(
                "An upload session already targets '{destination}'"
            )));
        }

        let session = self.sessions.create(destination, expected_bytes, expires_at)?;

        // The marker makes the reservation visible to name checks, and
        // outlives this process if the session is abandoned.
        let marker = resumable::reservation_path(destination);
        if let Err(e) = self.put(&marker, Bytes::new()).await {
            self.sessions.remove(session.id);
            return Err(e);
        }

        debug!(session_id = %session.id, destination, expected_bytes, "Opened upload session");
        Ok(session)
    }

    async fn upload_chunk(
        &self,
        session_id: Uuid,
        chunk_index: u32,
        data: Bytes,
    ) -> AppResult<()> {
        self.sessions
            .record_chunk(session_id, chunk_index, data.len() as u64)?;
        self.put(&resumable::chunk_path(session_id, chunk_index), data)
            .await
    }

    async fn verify_session(&self, session_id: Uuid) -> AppResult<BlobMeta> {
        let state = self.sessions.get(session_id)?;
        if state.session.received_bytes != state.session.expected_bytes {
            return Err(AppError::validation(format!(
                "Session incomplete: {} of {} bytes received",
                state.session.received_bytes, state.session.expected_bytes
            )));
        }

        let dest_path = self.resolve(&state.session.destination)?;
        self.ensure_parent(&dest_path).await?;
        let mut dest = fs::File::create(&dest_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob: {}", state.session.destination),
                e,
            )
        })?;

        for chunk_index in 0..state.chunk_count {
            let chunk = self
                .read_bytes(&resumable::chunk_path(session_id, chunk_index))
                .await?;
            dest.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to assemble chunk", e)
            })?;
        }
        dest.flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush blob", e))?;

        self.sessions.remove(session_id);
        self.discard_session_data(session_id, &state.session.destination)
            .await;

        debug!(
            session_id = %session_id,
            destination = %state.session.destination,
            bytes = state.session.received_bytes,
            "Published upload session"
        );
        self.metadata(&state.session.destination).await
    }

    async fn abort_session(&self, session_id: Uuid) -> AppResult<()> {
        if let Some(state) = self.sessions.remove(session_id) {
            self.discard_session_data(session_id, &state.session.destination)
                .await;
            debug!(session_id = %session_id, "Aborted upload session");
        }
        Ok(())
    }

    async fn session_reserved(&self, destination: &str) -> AppResult<bool> {
        if self.sessions.reserved(destination) {
            return Ok(true);
        }
        self.exists(&resumable::reservation_path(destination)).await
    }

    async fn sweep_expired_sessions(&self) -> AppResult<u32> {
        let mut swept = 0;
        for state in self.sessions.expired() {
            let session_id = state.session.id;
            self.sessions.remove(session_id);
            self.discard_session_data(session_id, &state.session.destination)
                .await;
            swept += 1;
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_read_delete() {
        let (_dir, store) = store().await;

        let data = Bytes::from("hello world");
        store.put("ws/file.txt", data.clone()).await.unwrap();
        assert!(store.exists("ws/file.txt").await.unwrap());
        assert_eq!(store.read_bytes("ws/file.txt").await.unwrap(), data);

        store.delete("ws/file.txt").await.unwrap();
        assert!(!store.exists("ws/file.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_components_stay_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blobs");
        let store = LocalBlobStore::new(root.to_str().unwrap()).await.unwrap();

        let err = store
            .put(
                "workspaces/w1/root/../../../../evil.txt",
                Bytes::from("owned"),
            )
            .await
            .expect_err("A path with .. components must be rejected");
        assert_eq!(err.kind, droplink_core::error::ErrorKind::Validation);
        assert!(!dir.path().join("evil.txt").exists());

        assert!(store.exists("../evil.txt").await.is_err());
        assert!(store.delete("../evil.txt").await.is_err());
        assert!(store.read_bytes("..\\evil.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_absent_is_success() {
        let (_dir, store) = store().await;
        store.delete("never/existed.bin").await.unwrap();
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let (_dir, store) = store().await;
        let expires = Utc::now() + Duration::hours(1);

        let session = store
            .initiate_session("ws/big.bin", 10, expires)
            .await
            .unwrap();
        assert!(store.session_reserved("ws/big.bin").await.unwrap());

        store
            .upload_chunk(session.id, 0, Bytes::from("hello "))
            .await
            .unwrap();
        store
            .upload_chunk(session.id, 1, Bytes::from("blob"))
            .await
            .unwrap();

        let meta = store.verify_session(session.id).await.unwrap();
        assert_eq!(meta.size_bytes, 10);
        assert_eq!(store.read_bytes("ws/big.bin").await.unwrap(), "hello blob");
        assert!(!store.session_reserved("ws/big.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_incomplete_session_rejected() {
        let (_dir, store) = store().await;
        let expires = Utc::now() + Duration::hours(1);

        let session = store
            .initiate_session("ws/big.bin", 10, expires)
            .await
            .unwrap();
        store
            .upload_chunk(session.id, 0, Bytes::from("short"))
            .await
            .unwrap();

        assert!(store.verify_session(session.id).await.is_err());
    }

    #[tokio::test]
    async fn test_abort_releases_reservation() {
        let (_dir, store) = store().await;
        let expires = Utc::now() + Duration::hours(1);

        let session = store
            .initiate_session("ws/big.bin", 10, expires)
            .await
            .unwrap();
        store.abort_session(session.id).await.unwrap();
        assert!(!store.session_reserved("ws/big.bin").await.unwrap());

        // Aborting again is harmless.
        store.abort_session(session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_marker_survives_registry_loss() {
        let dir = tempfile::tempdir().unwrap();
        let first = LocalBlobStore::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        let expires = Utc::now() + Duration::hours(1);
        first
            .initiate_session("ws/big.bin", 10, expires)
            .await
            .unwrap();

        // A fresh store over the same root has no registry state, but
        // the marker still reports the destination as reserved.
        let second = LocalBlobStore::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(second.session_reserved("ws/big.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let (_dir, store) = store().await;
        let expired = Utc::now() - Duration::minutes(1);

        store
            .initiate_session("ws/old.bin", 10, expired)
            .await
            .unwrap();
        assert_eq!(store.sweep_expired_sessions().await.unwrap(), 1);
        assert!(!store.session_reserved("ws/old.bin").await.unwrap());
    }
}
