//! Cron scheduler for the maintenance jobs.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{info, warn};

use droplink_core::config::WorkerConfig;
use droplink_core::error::AppError;
use droplink_core::result::AppResult;

use crate::jobs::{CleanupJob, ReconcileJob};

/// Schedules the cleanup and reconciliation jobs on their cron
/// expressions.
pub struct MaintenanceScheduler {
    scheduler: JobScheduler,
    config: WorkerConfig,
    cleanup: CleanupJob,
    reconcile: ReconcileJob,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    /// Create a new scheduler.
    pub async fn new(
        config: WorkerConfig,
        cleanup: CleanupJob,
        reconcile: ReconcileJob,
    ) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self {
            scheduler,
            config,
            cleanup,
            reconcile,
        })
    }

    /// Register both jobs and start the scheduler.
    pub async fn start(&self) -> AppResult<()> {
        if !self.config.enabled {
            info!("Maintenance worker disabled by configuration");
            return Ok(());
        }

        let cleanup = self.cleanup.clone();
        let cleanup_job = CronJob::new_async(self.config.cleanup_schedule.as_str(), move |_id, _lock| {
            let cleanup = cleanup.clone();
            Box::pin(async move {
                if let Err(e) = cleanup.run().await {
                    warn!(error = %e, "Cleanup sweep failed");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Invalid cleanup schedule: {e}")))?;

        let reconcile = self.reconcile.clone();
        let reconcile_job =
            CronJob::new_async(self.config.reconcile_schedule.as_str(), move |_id, _lock| {
                let reconcile = reconcile.clone();
                Box::pin(async move {
                    if let Err(e) = reconcile.run().await {
                        warn!(error = %e, "Counter reconciliation pass failed");
                    }
                })
            })
            .map_err(|e| AppError::internal(format!("Invalid reconcile schedule: {e}")))?;

        self.scheduler
            .add(cleanup_job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to schedule cleanup: {e}")))?;
        self.scheduler
            .add(reconcile_job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to schedule reconciliation: {e}")))?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!(
            cleanup_schedule = %self.config.cleanup_schedule,
            reconcile_schedule = %self.config.reconcile_schedule,
            "Maintenance scheduler started"
        );
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shut down scheduler: {e}")))?;
        info!("Maintenance scheduler shut down");
        Ok(())
    }
}
