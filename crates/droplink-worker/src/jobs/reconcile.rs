//! Usage counter reconciliation.

use std::sync::Arc;

use tracing::{info, warn};

use droplink_core::result::AppResult;
use droplink_core::traits::UsageCounter;
use droplink_database::repositories::workspace::WorkspaceRepository;

/// Recomputes every workspace counter from live file rows.
#[derive(Clone)]
pub struct ReconcileJob {
    workspace_repo: Arc<WorkspaceRepository>,
    counter: Arc<dyn UsageCounter>,
}

impl std::fmt::Debug for ReconcileJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileJob").finish()
    }
}

impl ReconcileJob {
    /// Create a new reconciliation job.
    pub fn new(workspace_repo: Arc<WorkspaceRepository>, counter: Arc<dyn UsageCounter>) -> Self {
        Self {
            workspace_repo,
            counter,
        }
    }

    /// One pass over all workspaces. Returns how many counters needed a
    /// correction.
    pub async fn run(&self) -> AppResult<u64> {
        let mut corrected = 0u64;
        for workspace_id in self.workspace_repo.all_ids().await? {
            match self.counter.reconcile(workspace_id).await {
                Ok(0) => {}
                Ok(correction) => {
                    corrected += 1;
                    info!(
                        workspace_id = %workspace_id,
                        correction_bytes = correction,
                        "Corrected drifted usage counter"
                    );
                }
                Err(e) => {
                    warn!(workspace_id = %workspace_id, error = %e, "Counter reconciliation failed");
                }
            }
        }
        Ok(corrected)
    }
}
