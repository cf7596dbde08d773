//! Deletion protocol tests: blob-first ordering, bulk tolerance,
//! failure downgrades, and folder deletion leaving blobs alone. Runs
//! the real services against the database with the in-memory blob
//! store.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::config::QuotaConfig;
use droplink_core::error::{AppError, ErrorKind};
use droplink_core::result::AppResult;
use droplink_core::traits::{BlobMeta, BlobStore, ByteStream, UploadSession};
use droplink_database::repositories::counter::WorkspaceUsageCounter;
use droplink_database::repositories::file::FileRepository;
use droplink_database::repositories::folder::FolderRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_database::repositories::workspace::WorkspaceRepository;
use droplink_entity::file::{CreateFile, File};
use droplink_entity::folder::CreateFolder;
use droplink_entity::{Context, UploadKind};
use droplink_service::deletion::DeletionService;
use droplink_service::quota::QuotaService;
use droplink_storage::MemoryBlobStore;

use super::helpers;

/// In-memory store whose `delete` fails for chosen paths, exercising
/// the failure half of the blob-first protocol.
#[derive(Debug)]
struct BlockedDeletes {
    inner: MemoryBlobStore,
    blocked: HashSet<String>,
}

impl BlockedDeletes {
    fn new(blocked: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            blocked: blocked.into_iter().collect(),
        }
    }
}

#[async_trait]
impl BlobStore for BlockedDeletes {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.inner.put(path, data).await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.inner.read_bytes(path).await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.inner.read(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        if self.blocked.contains(path) {
            return Err(AppError::storage(format!("Delete rejected: {path}")));
        }
        self.inner.delete(path).await
    }

    async fn metadata(&self, path: &str) -> AppResult<BlobMeta> {
        self.inner.metadata(path).await
    }

    async fn initiate_session(
        &self,
        destination: &str,
        expected_bytes: u64,
        expires_at: DateTime<Utc>,
    ) -> AppResult<UploadSession> {
        self.inner
            .initiate_session(destination, expected_bytes, expires_at)
            .await
    }

    async fn upload_chunk(
        &self,
        session_id: Uuid,
        chunk_index: u32,
        data: Bytes,
    ) -> AppResult<()> {
        self.inner.upload_chunk(session_id, chunk_index, data).await
    }

    async fn verify_session(&self, session_id: Uuid) -> AppResult<BlobMeta> {
        self.inner.verify_session(session_id).await
    }

    async fn abort_session(&self, session_id: Uuid) -> AppResult<()> {
        self.inner.abort_session(session_id).await
    }

    async fn session_reserved(&self, destination: &str) -> AppResult<bool> {
        self.inner.session_reserved(destination).await
    }

    async fn sweep_expired_sessions(&self) -> AppResult<u32> {
        self.inner.sweep_expired_sessions().await
    }
}

fn build_service(pool: &PgPool, blob: Arc<dyn BlobStore>) -> DeletionService {
    let quota = Arc::new(QuotaService::new(
        Arc::new(WorkspaceRepository::new(pool.clone())),
        Arc::new(WorkspaceUsageCounter::new(pool.clone())),
        QuotaConfig::default(),
    ));
    DeletionService::new(
        Arc::new(FileRepository::new(pool.clone())),
        Arc::new(FolderRepository::new(pool.clone())),
        Arc::new(LinkRepository::new(pool.clone())),
        blob,
        quota,
    )
}

async fn create_personal_file(
    pool: &PgPool,
    blob: &Arc<dyn BlobStore>,
    workspace_id: Uuid,
    folder_id: Option<Uuid>,
    name: &str,
) -> File {
    let storage_path = format!("workspaces/{workspace_id}/root/{name}");
    blob.put(&storage_path, Bytes::from_static(b"payload"))
        .await
        .expect("Failed to write blob");
    FileRepository::new(pool.clone())
        .create(&CreateFile {
            name: name.to_string(),
            file_size: 7,
            mime_type: None,
            storage_path,
            folder_id,
            kind: UploadKind::Personal { workspace_id },
        })
        .await
        .expect("Failed to create file row")
}

#[tokio::test]
async fn test_delete_file_removes_blob_and_row() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let blob: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let workspace = helpers::create_workspace(&pool, "del").await;
    let service = build_service(&pool, Arc::clone(&blob));

    let file = create_personal_file(&pool, &blob, workspace.id, None, "gone.bin").await;

    service.delete_file(file.id).await.expect("Delete failed");

    assert!(!blob.exists(&file.storage_path).await.unwrap());
    let row = FileRepository::new(pool.clone())
        .find_by_id(file.id)
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn test_delete_file_converges_when_blob_already_gone() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let blob: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let workspace = helpers::create_workspace(&pool, "del").await;
    let service = build_service(&pool, Arc::clone(&blob));

    let file = create_personal_file(&pool, &blob, workspace.id, None, "half.bin").await;
    blob.delete(&file.storage_path).await.unwrap();

    // A retry after a crash between blob and row delete must succeed.
    service.delete_file(file.id).await.expect("Retry must converge");
    assert!(
        FileRepository::new(pool.clone())
            .find_by_id(file.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_bulk_delete_tolerates_missing_rows() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let blob: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let workspace = helpers::create_workspace(&pool, "del").await;
    let service = build_service(&pool, Arc::clone(&blob));

    let a = create_personal_file(&pool, &blob, workspace.id, None, "a.bin").await;
    let b = create_personal_file(&pool, &blob, workspace.id, None, "b.bin").await;
    let missing = Uuid::new_v4();

    let outcome = service
        .bulk_delete(&[a.id, b.id, missing])
        .await
        .expect("Bulk delete failed");

    // The unknown id was already gone; it neither counts nor fails.
    assert_eq!(outcome.deleted_count, 2);
    assert!(outcome.failed_ids.is_empty());
    assert!(!blob.exists(&a.storage_path).await.unwrap());
    assert!(!blob.exists(&b.storage_path).await.unwrap());
}

#[tokio::test]
async fn test_delete_folder_detaches_files_and_keeps_blobs() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let blob: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let workspace = helpers::create_workspace(&pool, "del").await;
    let service = build_service(&pool, Arc::clone(&blob));

    let folder = FolderRepository::new(pool.clone())
        .create(&CreateFolder {
            name: "doomed".to_string(),
            parent_folder_id: None,
            context: Context::Workspace(workspace.id),
        })
        .await
        .expect("Failed to create folder");

    let file =
        create_personal_file(&pool, &blob, workspace.id, Some(folder.id), "keep.bin").await;

    let detached = service
        .delete_folder(folder.id)
        .await
        .expect("Folder delete failed");
    assert_eq!(detached, 1);

    // The folder row is gone; the file survives, detached, blob intact.
    assert!(
        FolderRepository::new(pool.clone())
            .find_by_id(folder.id)
            .await
            .unwrap()
            .is_none()
    );
    let survivor = FileRepository::new(pool.clone())
        .find_by_id(file.id)
        .await
        .unwrap()
        .expect("File must survive folder deletion");
    assert_eq!(survivor.folder_id, None);
    assert!(blob.exists(&survivor.storage_path).await.unwrap());
}

#[tokio::test]
async fn test_blob_delete_failure_leaves_row_untouched() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "del").await;
    let path = format!("workspaces/{}/root/stuck.bin", workspace.id);
    let blob: Arc<dyn BlobStore> = Arc::new(BlockedDeletes::new([path]));
    let service = build_service(&pool, Arc::clone(&blob));

    let file = create_personal_file(&pool, &blob, workspace.id, None, "stuck.bin").await;

    let err = service
        .delete_file(file.id)
        .await
        .expect_err("Blob failure must abort the deletion");
    assert_eq!(err.kind, ErrorKind::Storage);

    // Nothing changed: the row is intact and unflagged, the blob stays.
    let row = FileRepository::new(pool.clone())
        .find_by_id(file.id)
        .await
        .unwrap()
        .expect("Row must be untouched");
    assert!(!row.requires_cleanup);
    assert!(blob.exists(&file.storage_path).await.unwrap());
}

#[tokio::test]
async fn test_row_delete_failure_downgrades_to_orphan() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    // A trigger keyed on one sentinel name makes the row delete fail
    // after the blob delete already succeeded.
    sqlx::query(
        "CREATE OR REPLACE FUNCTION reject_pinned_file_delete() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'file row delete rejected'; END; \
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("DROP TRIGGER IF EXISTS reject_pinned_file_delete ON files")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_pinned_file_delete BEFORE DELETE ON files \
         FOR EACH ROW WHEN (OLD.name = 'pinned-row.bin') \
         EXECUTE FUNCTION reject_pinned_file_delete()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let blob: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let workspace = helpers::create_workspace(&pool, "del").await;
    let service = build_service(&pool, Arc::clone(&blob));
    let file = create_personal_file(&pool, &blob, workspace.id, None, "pinned-row.bin").await;

    // The billable blob is gone, so the operation reports success.
    service
        .delete_file(file.id)
        .await
        .expect("Orphan downgrade must not fail the caller");

    assert!(!blob.exists(&file.storage_path).await.unwrap());
    let row = FileRepository::new(pool.clone())
        .find_by_id(file.id)
        .await
        .unwrap()
        .expect("Row survives as a flagged orphan");
    assert!(row.requires_cleanup);

    sqlx::query("DROP TRIGGER IF EXISTS reject_pinned_file_delete ON files")
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bulk_delete_reports_partial_blob_failures() {
    let Some(pool) = helpers::test_pool().await else {
        return;
    };
    let workspace = helpers::create_workspace(&pool, "del").await;
    let blocked: Vec<String> = ["b.bin", "d.bin"]
        .iter()
        .map(|name| format!("workspaces/{}/root/{name}", workspace.id))
        .collect();
    let blob: Arc<dyn BlobStore> = Arc::new(BlockedDeletes::new(blocked));
    let service = build_service(&pool, Arc::clone(&blob));

    let mut files = Vec::new();
    for name in ["a.bin", "b.bin", "c.bin", "d.bin", "e.bin"] {
        files.push(create_personal_file(&pool, &blob, workspace.id, None, name).await);
    }
    let ids: Vec<Uuid> = files.iter().map(|f| f.id).collect();

    let outcome = service.bulk_delete(&ids).await.expect("Bulk delete failed");

    assert_eq!(outcome.deleted_count, 3);
    assert_eq!(outcome.failed_ids.len(), 2);
    assert!(outcome.failed_ids.contains(&files[1].id));
    assert!(outcome.failed_ids.contains(&files[3].id));

    let repo = FileRepository::new(pool.clone());
    for file in &files {
        let failed = outcome.failed_ids.contains(&file.id);
        // Failed files keep blob and row for a retry; the rest lose both.
        assert_eq!(blob.exists(&file.storage_path).await.unwrap(), failed);
        assert_eq!(repo.find_by_id(file.id).await.unwrap().is_some(), failed);
    }
}
