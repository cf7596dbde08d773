//! Blob-first deletion.
//!
//! The ordering is a billing-correctness requirement: a row must never
//! outlive its blob in the direction that charges the owner for bytes
//! they cannot reach. Blob delete failure aborts (row untouched,
//! retryable). Row delete failure after a successful blob delete
//! downgrades to an orphan: logged, flagged `requires_cleanup`, and the
//! operation still reports success — the billable resource is gone.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::traits::{BlobStore, UsageOperation};
use droplink_database::repositories::file::FileRepository;
use droplink_database::repositories::folder::FolderRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_entity::file::File;

use crate::quota::QuotaService;

/// Result of a bulk deletion: how many files were actually removed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BulkDeleteOutcome {
    /// Files whose blob and row were both removed (or whose row became
    /// a flagged orphan, which still counts as deleted for the caller).
    pub deleted_count: u64,
    /// File ids whose blob delete failed; these keep blob and row and
    /// can be retried.
    pub failed_ids: Vec<Uuid>,
}

/// Deletes files and folders under the blob-first protocol.
#[derive(Clone)]
pub struct DeletionService {
    file_repo: Arc<FileRepository>,
    folder_repo: Arc<FolderRepository>,
    link_repo: Arc<LinkRepository>,
    blob: Arc<dyn BlobStore>,
    quota: Arc<QuotaService>,
}

impl std::fmt::Debug for DeletionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionService").finish()
    }
}

impl DeletionService {
    /// Create a new deletion service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        folder_repo: Arc<FolderRepository>,
        link_repo: Arc<LinkRepository>,
        blob: Arc<dyn BlobStore>,
        quota: Arc<QuotaService>,
    ) -> Self {
        Self {
            file_repo,
            folder_repo,
            link_repo,
            blob,
            quota,
        }
    }

    /// Delete one file: blob first, then the row.
    ///
    /// Blob failure propagates and leaves the row untouched — the
    /// operation is retryable (deleting an already-absent blob counts
    /// as success, so the retry converges). Row failure after the blob
    /// went is downgraded to an orphan and the call still succeeds.
    pub async fn delete_file(&self, file_id: Uuid) -> AppResult<()> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;

        self.blob.delete(&file.storage_path).await?;

        self.finish_row_delete(&file).await;
        Ok(())
    }

    /// Delete many files. Blob deletions run independently; only files
    /// whose blob went proceed to the row delete. Partial failure is a
    /// normal outcome, reported through the counts.
    pub async fn bulk_delete(&self, file_ids: &[Uuid]) -> AppResult<BulkDeleteOutcome> {
        let mut cleared: Vec<File> = Vec::with_capacity(file_ids.len());
        let mut failed_ids = Vec::new();

        for &file_id in file_ids {
            let Some(file) = self.file_repo.find_by_id(file_id).await? else {
                // Already gone; nothing left to bill for.
                continue;
            };
            match self.blob.delete(&file.storage_path).await {
                Ok(()) => cleared.push(file),
                Err(e) => {
                    warn!(file_id = %file_id, error = %e, "Blob delete failed in bulk deletion");
                    failed_ids.push(file_id);
                }
            }
        }

        let ids: Vec<Uuid> = cleared.iter().map(|f| f.id).collect();
        let deleted_count = match self.file_repo.delete_many(&ids).await {
            Ok(count) => {
                for file in &cleared {
                    self.spawn_usage_adjustment(file);
                }
                count
            }
            Err(e) => {
                // Blobs are gone; flag every row instead of failing.
                warn!(
                    error = %e,
                    rows = ids.len(),
                    requires_cleanup = true,
                    "Bulk row delete failed after blob deletes; flagging orphans"
                );
                for file in &cleared {
                    self.flag_orphan(file).await;
                    self.spawn_usage_adjustment(file);
                }
                ids.len() as u64
            }
        };

        info!(
            requested = file_ids.len(),
            deleted = deleted_count,
            failed = failed_ids.len(),
            "Bulk deletion finished"
        );
        Ok(BulkDeleteOutcome {
            deleted_count,
            failed_ids,
        })
    }

    /// Delete a folder tree.
    ///
    /// Folders are not billable, so this never touches the blob store:
    /// the row delete cascades to subfolders, and contained files are
    /// detached (`folder_id` cleared) with blobs, rows, and billing all
    /// intact. Returns how many files were detached.
    pub async fn delete_folder(&self, folder_id: Uuid) -> AppResult<u64> {
        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        let detached = self.file_repo.list_in_subtree(folder_id).await?.len() as u64;
        self.folder_repo.delete(folder_id).await?;

        info!(
            folder_id = %folder_id,
            name = %folder.name,
            files_detached = detached,
            "Deleted folder"
        );
        Ok(detached)
    }

    /// Row delete half of the file protocol, with the orphan downgrade.
    async fn finish_row_delete(&self, file: &File) {
        match self.file_repo.delete(file.id).await {
            Ok(_) => {
                info!(file_id = %file.id, name = %file.name, "Deleted file");
            }
            Err(e) => {
                warn!(
                    file_id = %file.id,
                    storage_path = %file.storage_path,
                    error = %e,
                    requires_cleanup = true,
                    "Row delete failed after blob delete; flagging orphan"
                );
                self.flag_orphan(file).await;
            }
        }
        self.spawn_usage_adjustment(file);
    }

    /// Best-effort `requires_cleanup` flag; the maintenance sweep
    /// catches rows this misses.
    async fn flag_orphan(&self, file: &File) {
        if let Err(e) = self.file_repo.mark_requires_cleanup(file.id).await {
            warn!(file_id = %file.id, error = %e, "Failed to flag orphaned row");
        }
    }

    /// Background usage credit for a removed file, attributed to the
    /// owning workspace (resolving through the link for link uploads).
    fn spawn_usage_adjustment(&self, file: &File) {
        let quota = Arc::clone(&self.quota);
        let link_repo = Arc::clone(&self.link_repo);
        let file_id = file.id;
        let file_size = file.file_size;
        let workspace_id = file.workspace_id;
        let link_id = file.link_id;

        tokio::spawn(async move {
            let workspace_id = match (workspace_id, link_id) {
                (Some(id), _) => Some(id),
                (None, Some(link_id)) => match link_repo.find_by_id(link_id).await {
                    Ok(link) => link.map(|l| l.workspace_id),
                    Err(e) => {
                        warn!(file_id = %file_id, error = %e, "Failed to resolve owning workspace");
                        None
                    }
                },
                (None, None) => None,
            };
            let Some(workspace_id) = workspace_id else {
                return;
            };
            if let Err(e) = quota
                .adjust_usage(workspace_id, -file_size, UsageOperation::Delete, file_id)
                .await
            {
                warn!(
                    workspace_id = %workspace_id,
                    file_id = %file_id,
                    error = %e,
                    "Background usage credit failed"
                );
            }
        });
    }
}
