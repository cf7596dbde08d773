//! Quota gate for upload admission.
//!
//! Two distinct denials come out of here: the hard plan limit
//! (`QuotaExceeded`, carries usage and limit) and the sliding-window
//! rate limit (`RateLimited`). Callers surface them differently, so
//! they must never be conflated.
//!
//! Usage reads go through a TTL cache: a check may act on a counter up
//! to `counter_staleness_seconds` old. The counter itself is only ever
//! moved by atomic adjustments behind the [`UsageCounter`] trait.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use moka::future::Cache;
use tracing::{debug, info};
use uuid::Uuid;

use droplink_core::config::QuotaConfig;
use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::traits::{UsageCounter, UsageOperation};
use droplink_database::repositories::workspace::WorkspaceRepository;

/// Point-in-time usage snapshot for a workspace.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct QuotaStatus {
    /// Bytes currently counted against the workspace.
    pub used_bytes: i64,
    /// The plan limit in bytes.
    pub limit_bytes: i64,
}

/// Per-workspace sliding window of admitted uploads.
#[derive(Debug, Default)]
struct RateWindows {
    windows: DashMap<Uuid, VecDeque<Instant>>,
}

impl RateWindows {
    /// Admit one upload at `now`, or report the window is full.
    ///
    /// Only admitted uploads occupy a slot; denied attempts do not
    /// extend the caller's own lockout.
    fn try_admit(&self, workspace_id: Uuid, now: Instant, window: Duration, max: u32) -> bool {
        let mut entry = self.windows.entry(workspace_id).or_default();
        while let Some(front) = entry.front() {
            if now.duration_since(*front) >= window {
                entry.pop_front();
            } else {
                break;
            }
        }
        if entry.len() >= max as usize {
            return false;
        }
        entry.push_back(now);
        true
    }
}

/// Gates uploads on plan limits and upload frequency, and applies
/// confirmed usage deltas.
#[derive(Clone)]
pub struct QuotaService {
    workspace_repo: Arc<WorkspaceRepository>,
    counter: Arc<dyn UsageCounter>,
    usage_cache: Cache<Uuid, QuotaStatus>,
    rate: Arc<RateWindows>,
    config: QuotaConfig,
}

impl std::fmt::Debug for QuotaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaService").finish()
    }
}

impl QuotaService {
    /// Create a new quota service.
    pub fn new(
        workspace_repo: Arc<WorkspaceRepository>,
        counter: Arc<dyn UsageCounter>,
        config: QuotaConfig,
    ) -> Self {
        let usage_cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.counter_staleness_seconds))
            .max_capacity(10_000)
            .build();
        Self {
            workspace_repo,
            counter,
            usage_cache,
            rate: Arc::new(RateWindows::default()),
            config,
        }
    }

    /// Current usage and limit for a workspace (possibly cached within
    /// the staleness window).
    pub async fn status(&self, workspace_id: Uuid) -> AppResult<QuotaStatus> {
        let workspace_repo = Arc::clone(&self.workspace_repo);
        let counter = Arc::clone(&self.counter);

        self.usage_cache
            .try_get_with(workspace_id, async move {
                let workspace = workspace_repo
                    .find_by_id(workspace_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Workspace {workspace_id} not found"))
                    })?;
                let used_bytes = counter.current(workspace_id).await?;
                Ok(QuotaStatus {
                    used_bytes,
                    limit_bytes: workspace.storage_limit_bytes,
                })
            })
            .await
            .map_err(|e: Arc<AppError>| e.as_ref().clone())
    }

    /// Admit or deny an upload of `incoming_bytes`.
    ///
    /// Denials are `QuotaExceeded` (plan limit) or `RateLimited`
    /// (too many uploads in the window) — distinct kinds with distinct
    /// details.
    pub async fn check_quota(&self, workspace_id: Uuid, incoming_bytes: i64) -> AppResult<()> {
        let status = self.status(workspace_id).await?;
        if status.used_bytes + incoming_bytes > status.limit_bytes {
            debug!(
                workspace_id = %workspace_id,
                used = status.used_bytes,
                limit = status.limit_bytes,
                incoming = incoming_bytes,
                "Upload denied: plan limit"
            );
            return Err(AppError::quota_exceeded(
                status.used_bytes,
                status.limit_bytes,
                incoming_bytes,
            ));
        }

        let window = Duration::from_secs(self.config.rate_window_seconds);
        if !self.rate.try_admit(
            workspace_id,
            Instant::now(),
            window,
            self.config.rate_max_uploads,
        ) {
            debug!(
                workspace_id = %workspace_id,
                window_seconds = self.config.rate_window_seconds,
                max_uploads = self.config.rate_max_uploads,
                "Upload denied: rate window full"
            );
            return Err(AppError::rate_limited(
                self.config.rate_window_seconds,
                self.config.rate_max_uploads,
            ));
        }
        Ok(())
    }

    /// Apply a confirmed usage delta. Idempotent per
    /// `(operation, file_id)`, so it may be retried freely.
    pub async fn adjust_usage(
        &self,
        workspace_id: Uuid,
        delta_bytes: i64,
        operation: UsageOperation,
        file_id: Uuid,
    ) -> AppResult<()> {
        self.counter
            .adjust(workspace_id, delta_bytes, operation, file_id)
            .await?;
        self.usage_cache.invalidate(&workspace_id).await;
        Ok(())
    }

    /// Recompute one workspace counter from live file rows.
    pub async fn reconcile(&self, workspace_id: Uuid) -> AppResult<i64> {
        let correction = self.counter.reconcile(workspace_id).await?;
        self.usage_cache.invalidate(&workspace_id).await;
        if correction != 0 {
            info!(
                workspace_id = %workspace_id,
                correction_bytes = correction,
                "Reconciled usage counter"
            );
        }
        Ok(correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_admits_up_to_max() {
        let rate = RateWindows::default();
        let id = Uuid::new_v4();
        let window = Duration::from_secs(60);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(rate.try_admit(id, now, window, 3));
        }
        assert!(!rate.try_admit(id, now, window, 3));
    }

    #[test]
    fn test_window_slides() {
        let rate = RateWindows::default();
        let id = Uuid::new_v4();
        let window = Duration::from_secs(60);
        let start = Instant::now();

        assert!(rate.try_admit(id, start, window, 1));
        assert!(!rate.try_admit(id, start + Duration::from_secs(30), window, 1));
        // The first admission ages out of the window.
        assert!(rate.try_admit(id, start + Duration::from_secs(61), window, 1));
    }

    #[test]
    fn test_windows_are_per_workspace() {
        let rate = RateWindows::default();
        let window = Duration::from_secs(60);
        let now = Instant::now();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(rate.try_admit(a, now, window, 1));
        assert!(rate.try_admit(b, now, window, 1));
        assert!(!rate.try_admit(a, now, window, 1));
    }
}
