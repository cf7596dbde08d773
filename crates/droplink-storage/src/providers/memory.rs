//! In-memory blob store, used in tests and single-node development.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::traits::{BlobMeta, BlobStore, ByteStream, UploadSession};

use crate::resumable::{self, SessionRegistry};

/// Blob store keeping everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<String, (Bytes, DateTime<Utc>)>>,
    sessions: Arc<SessionRegistry>,
}

impl MemoryBlobStore {
    /// Create an empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    fn discard_session_data(&self, session_id: Uuid, chunk_count: u32, destination: &str) {
        for chunk_index in 0..chunk_count {
            self.blobs
                .remove(&resumable::chunk_path(session_id, chunk_index));
        }
        self.blobs.remove(&resumable::reservation_path(destination));
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.blobs.insert(path.to_string(), (data, Utc::now()));
        Ok(())
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.blobs
            .get(path)
            .map(|entry| entry.0.clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {path}")))
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let data = self.read_bytes(path).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(path))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.blobs.remove(path);
        Ok(())
    }

    async fn metadata(&self, path: &str) -> AppResult<BlobMeta> {
        self.blobs
            .get(path)
            .map(|entry| BlobMeta {
                path: path.to_string(),
                size_bytes: entry.0.len() as u64,
                last_modified: Some(entry.1),
            })
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {path}")))
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
        self.put(&resumable::reservation_path(destination), Bytes::new())
            .await?;
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

        let mut assembled = Vec::with_capacity(state.session.received_bytes as usize);
        for chunk_index in 0..state.chunk_count {
            let chunk = self
                .read_bytes(&resumable::chunk_path(session_id, chunk_index))
                .await?;
            assembled.extend_from_slice(&chunk);
        }
        self.put(&state.session.destination, Bytes::from(assembled))
            .await?;

        self.sessions.remove(session_id);
        self.discard_session_data(session_id, state.chunk_count, &state.session.destination);
        self.metadata(&state.session.destination).await
    }

    async fn abort_session(&self, session_id: Uuid) -> AppResult<()> {
        if let Some(state) = self.sessions.remove(session_id) {
            self.discard_session_data(session_id, state.chunk_count, &state.session.destination);
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
            self.discard_session_data(session_id, state.chunk_count, &state.session.destination);
            swept += 1;
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_put_read_delete() {
        let store = MemoryBlobStore::new();

        store.put("a/b.txt", Bytes::from("data")).await.unwrap();
        assert_eq!(store.read_bytes("a/b.txt").await.unwrap(), "data");
        assert_eq!(store.metadata("a/b.txt").await.unwrap().size_bytes, 4);

        store.delete("a/b.txt").await.unwrap();
        assert!(!store.exists("a/b.txt").await.unwrap());
        // Deleting again stays successful.
        store.delete("a/b.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_session_assembles_chunks() {
        let store = MemoryBlobStore::new();
        let expires = Utc::now() + Duration::hours(1);

        let session = store.initiate_session("f.bin", 6, expires).await.unwrap();
        store
            .upload_chunk(session.id, 0, Bytes::from("foo"))
            .await
            .unwrap();
        store
            .upload_chunk(session.id, 1, Bytes::from("bar"))
            .await
            .unwrap();

        store.verify_session(session.id).await.unwrap();
        assert_eq!(store.read_bytes("f.bin").await.unwrap(), "foobar");
        assert!(!store.session_reserved("f.bin").await.unwrap());
    }
}
