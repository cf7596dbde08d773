//! Orphan and session cleanup.
//!
//! Rows flagged `requires_cleanup` are the second half of a deletion
//! whose blob already went; this job retires them. Expired resumable
//! sessions release their destination reservations so the names become
//! available again.

use std::sync::Arc;

use tracing::{info, warn};

use droplink_core::result::AppResult;
use droplink_core::traits::BlobStore;
use droplink_database::repositories::file::FileRepository;

/// Rows processed per sweep.
const SWEEP_BATCH_SIZE: i64 = 500;

/// Sweeps orphaned file rows and expired upload sessions.
#[derive(Clone)]
pub struct CleanupJob {
    file_repo: Arc<FileRepository>,
    blob: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for CleanupJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupJob").finish()
    }
}

impl CleanupJob {
    /// Create a new cleanup job.
    pub fn new(file_repo: Arc<FileRepository>, blob: Arc<dyn BlobStore>) -> Self {
        Self { file_repo, blob }
    }

    /// One sweep: retire flagged rows, then expired sessions. Returns
    /// (rows retired, sessions swept).
    pub async fn run(&self) -> AppResult<(u64, u32)> {
        let mut retired = 0u64;
        let flagged = self.file_repo.find_requiring_cleanup(SWEEP_BATCH_SIZE).await?;

        for file in &flagged {
            // The flag means the blob should be gone; make sure before
            // dropping the row, so a mistakenly flagged row cannot strand
            // its blob.
            match self.blob.exists(&file.storage_path).await {
                Ok(true) => {
                    if let Err(e) = self.blob.delete(&file.storage_path).await {
                        warn!(
                            file_id = %file.id,
                            storage_path = %file.storage_path,
                            error = %e,
                            "Cleanup blob delete failed, leaving row for next sweep"
                        );
                        continue;
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(file_id = %file.id, error = %e, "Cleanup blob check failed");
                    continue;
                }
            }

            match self.file_repo.delete(file.id).await {
                Ok(_) => retired += 1,
                Err(e) => {
                    warn!(file_id = %file.id, error = %e, "Cleanup row delete failed");
                }
            }
        }

        let sessions = self.blob.sweep_expired_sessions().await?;

        if retired > 0 || sessions > 0 {
            info!(
                rows_retired = retired,
                sessions_swept = sessions,
                "Cleanup sweep finished"
            );
        }
        Ok((retired, sessions))
    }
}
