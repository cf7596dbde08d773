//! Upload service: admission, dual-layer name reservation, and the
//! simple and resumable deposit flows.
//!
//! Protocol ordering is fixed: quota gate, name reservation, blob
//! write, then the database row — the row only exists once the blob is
//! verified. Usage adjustment runs afterwards as a best-effort
//! background task; it is idempotent, so the maintenance reconciler can
//! repair anything it misses.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use droplink_core::config::StorageConfig;
use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::traits::{BlobStore, Notification, UploadSession, UsageOperation};
use droplink_database::repositories::batch::BatchRepository;
use droplink_database::repositories::file::FileRepository;
use droplink_database::repositories::folder::FolderRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_database::repositories::permission::PermissionRepository;
use droplink_database::repositories::workspace::WorkspaceRepository;
use droplink_entity::batch::{Batch, CreateBatch};
use droplink_entity::context::{self, Context};
use droplink_entity::file::{CreateFile, File, UploadKind};
use droplink_entity::link::{Link, LinkType};

use crate::context::RequestContext;
use crate::notify::NotificationDispatcher;
use crate::quota::QuotaService;

use super::naming;

/// Resolve a collision-free name against two independent layers.
///
/// The database is consulted first; only names absent there are tested
/// against the blob layer (final path and session reservations). A name
/// taken in either layer advances the numbered sequence. Past
/// `max_attempts`, a timestamp-suffixed name guarantees termination.
pub async fn reserve_name<Db, DbFut, Blob, BlobFut>(
    candidate: &str,
    max_attempts: u32,
    db_taken: Db,
    blob_taken: Blob,
) -> AppResult<String>
where
    Db: Fn(String) -> DbFut,
    DbFut: Future<Output = AppResult<bool>>,
    Blob: Fn(String) -> BlobFut,
    BlobFut: Future<Output = AppResult<bool>>,
{
    for n in 0..=max_attempts {
        let name = naming::numbered_candidate(candidate, n);
        if db_taken(name.clone()).await? {
            continue;
        }
        if blob_taken(name.clone()).await? {
            continue;
        }
        return Ok(name);
    }

    let fallback = naming::timestamp_fallback(candidate, Utc::now());
    warn!(
        candidate,
        max_attempts, fallback, "Name sequence exhausted, using timestamp fallback"
    );
    Ok(fallback)
}

/// A resumable upload admitted but not yet completed. Holds everything
/// needed to create the database row once the blob is verified.
#[derive(Debug, Clone)]
struct PendingUpload {
    name: String,
    folder_id: Option<Uuid>,
    kind: UploadKind,
    mime_type: Option<String>,
    storage_path: String,
    quota_workspace_id: Uuid,
}

/// Request for a simple (single-request) personal upload.
#[derive(Debug, Clone)]
pub struct PersonalUploadParams {
    /// The owner's workspace.
    pub workspace_id: Uuid,
    /// Target folder (None = loose at workspace root).
    pub folder_id: Option<Uuid>,
    /// Requested file name.
    pub file_name: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

/// Request for a deposit into an open batch.
#[derive(Debug, Clone)]
pub struct BatchDepositParams {
    /// The open batch.
    pub batch_id: Uuid,
    /// Requested file name.
    pub file_name: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

/// Handles upload admission and both deposit flows.
#[derive(Clone)]
pub struct UploadService {
    file_repo: Arc<FileRepository>,
    folder_repo: Arc<FolderRepository>,
    link_repo: Arc<LinkRepository>,
    batch_repo: Arc<BatchRepository>,
    workspace_repo: Arc<WorkspaceRepository>,
    permission_repo: Arc<PermissionRepository>,
    blob: Arc<dyn BlobStore>,
    quota: Arc<QuotaService>,
    notifications: NotificationDispatcher,
    config: StorageConfig,
    pending: Arc<DashMap<Uuid, PendingUpload>>,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService").finish()
    }
}

impl UploadService {
    /// Create a new upload service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file_repo: Arc<FileRepository>,
        folder_repo: Arc<FolderRepository>,
        link_repo: Arc<LinkRepository>,
        batch_repo: Arc<BatchRepository>,
        workspace_repo: Arc<WorkspaceRepository>,
        permission_repo: Arc<PermissionRepository>,
        blob: Arc<dyn BlobStore>,
        quota: Arc<QuotaService>,
        notifications: NotificationDispatcher,
        config: StorageConfig,
    ) -> Self {
        Self {
            file_repo,
            folder_repo,
            link_repo,
            batch_repo,
            workspace_repo,
            permission_repo,
            blob,
            quota,
            notifications,
            config,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// The blob path for a name at a location.
    fn storage_path(context: Context, folder_id: Option<Uuid>, name: &str) -> String {
        let scope = match context {
            Context::Workspace(id) => format!("workspaces/{id}"),
            Context::Link(id) => format!("links/{id}"),
        };
        match folder_id {
            Some(folder_id) => format!("{scope}/{folder_id}/{name}"),
            None => format!("{scope}/root/{name}"),
        }
    }

    /// Reserve a collision-free name at a location, checking the
    /// database and the blob store (final paths and open session
    /// reservations). Returns the name and its blob path.
    pub async fn reserve_upload_name(
        &self,
        candidate: &str,
        folder_id: Option<Uuid>,
        context: Context,
    ) -> AppResult<(String, String)> {
        naming::validate_file_name(candidate)?;
        let name = reserve_name(
            candidate,
            self.config.max_dedup_attempts,
            |name| {
                let file_repo = Arc::clone(&self.file_repo);
                async move { file_repo.name_exists(folder_id, context, &name).await }
            },
            |name| {
                let blob = Arc::clone(&self.blob);
                let path = Self::storage_path(context, folder_id, &name);
                async move {
                    if blob.exists(&path).await? {
                        return Ok(true);
                    }
                    blob.session_reserved(&path).await
                }
            },
        )
        .await?;

        let path = Self::storage_path(context, folder_id, &name);
        Ok((name, path))
    }

    /// Simple personal upload into the caller's own workspace.
    pub async fn upload_personal(
        &self,
        ctx: &RequestContext,
        params: PersonalUploadParams,
    ) -> AppResult<File> {
        let email = ctx.require_email()?;
        let workspace = self
            .workspace_repo
            .find_by_id(params.workspace_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Workspace {} not found", params.workspace_id))
            })?;
        if workspace.owner_email != email {
            return Err(AppError::forbidden("Workspace belongs to another owner"));
        }

        let target = Context::Workspace(workspace.id);
        self.check_folder_context(params.folder_id, target).await?;

        let size = params.data.len() as i64;
        self.check_size(size as u64)?;
        self.quota.check_quota(workspace.id, size).await?;

        let (name, storage_path) = self
            .reserve_upload_name(&params.file_name, params.folder_id, target)
            .await?;

        self.blob.put(&storage_path, params.data).await?;

        let file = self
            .file_repo
            .create(&CreateFile {
                name,
                file_size: size,
                mime_type: params.mime_type,
                storage_path,
                folder_id: params.folder_id,
                kind: UploadKind::Personal {
                    workspace_id: workspace.id,
                },
            })
            .await?;

        info!(
            file_id = %file.id,
            name = %file.name,
            size = file.file_size,
            workspace_id = %workspace.id,
            "Personal upload completed"
        );

        self.spawn_usage_adjustment(workspace.id, size, UsageOperation::Upload, file.id);
        Ok(file)
    }

    /// Open a batch for an external upload session through a link.
    ///
    /// The link must be active and unexpired. Generated links target
    /// their source folder; base and custom links target their root.
    pub async fn open_batch(
        &self,
        link: &Link,
        uploader_name: &str,
        uploader_email: Option<&str>,
    ) -> AppResult<Batch> {
        self.check_link_accepts_uploads(link)?;

        let target_folder_id = match link.link_type {
            LinkType::Generated => link.source_folder_id,
            LinkType::Base | LinkType::Custom => None,
        };

        let batch = self
            .batch_repo
            .create(&CreateBatch {
                link_id: link.id,
                uploader_name: uploader_name.to_string(),
                uploader_email: uploader_email.map(str::to_string),
                target_folder_id,
            })
            .await?;

        info!(
            batch_id = %batch.id,
            link_id = %link.id,
            uploader = uploader_name,
            "Opened upload batch"
        );
        Ok(batch)
    }

    /// Deposit one file into an open batch.
    pub async fn deposit_into_batch(&self, params: BatchDepositParams) -> AppResult<File> {
        let (link, folder_id, kind) = self.resolve_batch_target(params.batch_id).await?;

        let size = params.data.len() as i64;
        self.check_size(size as u64)?;
        self.quota.check_quota(link.workspace_id, size).await?;

        let target = kind.context();
        let (name, storage_path) = self
            .reserve_upload_name(&params.file_name, folder_id, target)
            .await?;

        self.blob.put(&storage_path, params.data).await?;

        let file = self
            .file_repo
            .create(&CreateFile {
                name,
                file_size: size,
                mime_type: params.mime_type,
                storage_path,
                folder_id,
                kind,
            })
            .await?;

        info!(
            file_id = %file.id,
            name = %file.name,
            size = file.file_size,
            batch_id = %params.batch_id,
            link_id = %link.id,
            "Batch deposit completed"
        );

        self.spawn_usage_adjustment(link.workspace_id, size, UsageOperation::Upload, file.id);
        Ok(file)
    }

    /// Close a batch: notify the link's verified owner/editor grants if
    /// the link asks for it. Never fails the caller.
    pub async fn complete_batch(&self, batch_id: Uuid) -> AppResult<Vec<File>> {
        let batch = self
            .batch_repo
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Batch {batch_id} not found")))?;
        let link = self
            .link_repo
            .find_by_id(batch.link_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Link {} not found", batch.link_id)))?;
        let files = self.file_repo.list_by_batch(batch_id).await?;

        if link.config()?.notify_on_upload && !files.is_empty() {
            let recipients = self
                .permission_repo
                .notification_recipients(link.id)
                .await
                .unwrap_or_default();
            for recipient in recipients {
                self.notifications.fire_and_forget(Notification {
                    recipient,
                    event: "upload_received".to_string(),
                    payload: json!({
                        "link_id": link.id,
                        "slug": link.slug,
                        "batch_id": batch.id,
                        "uploader_name": batch.uploader_name,
                        "file_count": files.len(),
                    }),
                });
            }
        }

        info!(batch_id = %batch_id, files = files.len(), "Completed upload batch");
        Ok(files)
    }

    /// Start a resumable upload into a batch. The destination name is
    /// reserved now; the database row appears only after
    /// [`complete_resumable`](Self::complete_resumable) verifies the
    /// blob.
    pub async fn initiate_resumable(
        &self,
        batch_id: Uuid,
        file_name: &str,
        file_size: u64,
        mime_type: Option<String>,
    ) -> AppResult<UploadSession> {
        let (link, folder_id, kind) = self.resolve_batch_target(batch_id).await?;

        self.check_size(file_size)?;
        self.quota
            .check_quota(link.workspace_id, file_size as i64)
            .await?;

        let target = kind.context();
        let (name, storage_path) = self
            .reserve_upload_name(file_name, folder_id, target)
            .await?;

        let expires_at = Utc::now() + chrono::Duration::hours(self.config.session_ttl_hours);
        let session = self
            .blob
            .initiate_session(&storage_path, file_size, expires_at)
            .await?;

        self.pending.insert(
            session.id,
            PendingUpload {
                name,
                folder_id,
                kind,
                mime_type,
                storage_path,
                quota_workspace_id: link.workspace_id,
            },
        );

        info!(
            session_id = %session.id,
            batch_id = %batch_id,
            size = file_size,
            "Initiated resumable upload"
        );
        Ok(session)
    }

    /// Append a chunk to a resumable upload.
    pub async fn upload_chunk(
        &self,
        session_id: Uuid,
        chunk_index: u32,
        data: Bytes,
    ) -> AppResult<()> {
        if data.len() as u64 > self.config.chunk_size_bytes {
            return Err(AppError::validation(format!(
                "Chunk exceeds maximum chunk size of {} bytes",
                self.config.chunk_size_bytes
            )));
        }
        self.blob.upload_chunk(session_id, chunk_index, data).await
    }

    /// Verify and publish a resumable upload, creating its database row.
    pub async fn complete_resumable(&self, session_id: Uuid) -> AppResult<File> {
        let pending = self
            .pending
            .get(&session_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| {
                AppError::not_found(format!("Upload session {session_id} not found"))
            })?;

        let meta = self.blob.verify_session(session_id).await?;
        self.pending.remove(&session_id);

        let size = meta.size_bytes as i64;
        let file = self
            .file_repo
            .create(&CreateFile {
                name: pending.name,
                file_size: size,
                mime_type: pending.mime_type,
                storage_path: pending.storage_path,
                folder_id: pending.folder_id,
                kind: pending.kind,
            })
            .await?;

        info!(
            session_id = %session_id,
            file_id = %file.id,
            size = file.file_size,
            "Resumable upload completed"
        );

        self.spawn_usage_adjustment(
            pending.quota_workspace_id,
            size,
            UsageOperation::Upload,
            file.id,
        );
        Ok(file)
    }

    /// Abort a resumable upload and release its reservation.
    pub async fn abort_resumable(&self, session_id: Uuid) -> AppResult<()> {
        self.pending.remove(&session_id);
        self.blob.abort_session(session_id).await
    }

    /// Load a batch and derive the deposit target: the link, the folder
    /// files land in, and the file-row shape.
    async fn resolve_batch_target(
        &self,
        batch_id: Uuid,
    ) -> AppResult<(Link, Option<Uuid>, UploadKind)> {
        let batch = self
            .batch_repo
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Batch {batch_id} not found")))?;
        let link = self
            .link_repo
            .find_by_id(batch.link_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Link {} not found", batch.link_id)))?;
        self.check_link_accepts_uploads(&link)?;

        let (folder_id, kind) = match link.link_type {
            LinkType::Generated => (
                batch.target_folder_id,
                UploadKind::GeneratedLinkUpload {
                    workspace_id: link.workspace_id,
                    batch_id: batch.id,
                },
            ),
            LinkType::Base | LinkType::Custom => {
                let root = self.folder_repo.find_root_for_link(link.id).await?;
                (
                    root.map(|f| f.id),
                    UploadKind::LinkUpload {
                        link_id: link.id,
                        batch_id: batch.id,
                    },
                )
            }
        };
        Ok((link, folder_id, kind))
    }

    /// If a target folder is given, it must exist and live in the
    /// target context. Application half of the inheritance invariant;
    /// the database trigger rejects the same writes independently.
    async fn check_folder_context(
        &self,
        folder_id: Option<Uuid>,
        target: Context,
    ) -> AppResult<()> {
        let Some(folder_id) = folder_id else {
            return Ok(());
        };
        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;
        context::validate_child(target, Some(folder.context()?))
    }

    fn check_size(&self, size: u64) -> AppResult<()> {
        if size > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }
        Ok(())
    }

    fn check_link_accepts_uploads(&self, link: &Link) -> AppResult<()> {
        if !link.is_active {
            return Err(AppError::validation("Link is not accepting uploads"));
        }
        if link.config()?.is_expired(Utc::now()) {
            return Err(AppError::validation("Link has expired"));
        }
        Ok(())
    }

    fn spawn_usage_adjustment(
        &self,
        workspace_id: Uuid,
        delta_bytes: i64,
        operation: UsageOperation,
        file_id: Uuid,
    ) {
        let quota = Arc::clone(&self.quota);
        tokio::spawn(async move {
            if let Err(e) = quota
                .adjust_usage(workspace_id, delta_bytes, operation, file_id)
                .await
            {
                // The ledger is idempotent; the reconciler repairs
                // anything dropped here.
                warn!(
                    workspace_id = %workspace_id,
                    file_id = %file_id,
                    delta_bytes,
                    error = %e,
                    "Background usage adjustment failed"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn run_reserve(
        candidate: &str,
        db_names: &[&str],
        blob_names: &[&str],
    ) -> AppResult<String> {
        let db: HashSet<String> = db_names.iter().map(|s| s.to_string()).collect();
        let blob: HashSet<String> = blob_names.iter().map(|s| s.to_string()).collect();
        reserve_name(
            candidate,
            1000,
            |name| {
                let taken = db.contains(&name);
                async move { Ok(taken) }
            },
            |name| {
                let taken = blob.contains(&name);
                async move { Ok(taken) }
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_free_name_kept() {
        assert_eq!(
            run_reserve("report.pdf", &[], &[]).await.unwrap(),
            "report.pdf"
        );
    }

    #[tokio::test]
    async fn test_collision_in_database_only() {
        assert_eq!(
            run_reserve("report.pdf", &["report.pdf"], &[]).await.unwrap(),
            "report (1).pdf"
        );
    }

    #[tokio::test]
    async fn test_collision_in_blob_store_only() {
        assert_eq!(
            run_reserve("report.pdf", &[], &["report.pdf"]).await.unwrap(),
            "report (1).pdf"
        );
    }

    #[tokio::test]
    async fn test_collision_in_both_layers() {
        assert_eq!(
            run_reserve("report.pdf", &["report.pdf"], &["report.pdf"])
                .await
                .unwrap(),
            "report (1).pdf"
        );
    }

    #[tokio::test]
    async fn test_sequence_walks_past_split_collisions() {
        // (1) taken in the database, (2) taken in the blob store.
        assert_eq!(
            run_reserve(
                "report.pdf",
                &["report.pdf", "report (1).pdf"],
                &["report (2).pdf"],
            )
            .await
            .unwrap(),
            "report (3).pdf"
        );
    }

    #[tokio::test]
    async fn test_exhausted_sequence_falls_back_to_timestamp() {
        let db: Vec<String> = (0..=3).map(|n| naming::numbered_candidate("a.txt", n)).collect();
        let db_refs: Vec<&str> = db.iter().map(String::as_str).collect();

        let name = {
            let db: HashSet<String> = db_refs.iter().map(|s| s.to_string()).collect();
            reserve_name(
                "a.txt",
                3,
                |name| {
                    let taken = db.contains(&name);
                    async move { Ok(taken) }
                },
                |_| async move { Ok(false) },
            )
            .await
            .unwrap()
        };

        assert!(name.starts_with("a ("));
        assert!(name.ends_with(").txt"));
        assert!(!db.contains(&name));
    }
}
