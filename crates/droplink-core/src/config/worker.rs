//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Maintenance worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron schedule for orphaned-row cleanup.
    #[serde(default = "default_cleanup_schedule")]
    pub cleanup_schedule: String,
    /// Cron schedule for usage counter reconciliation.
    #[serde(default = "default_reconcile_schedule")]
    pub reconcile_schedule: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_schedule: default_cleanup_schedule(),
            reconcile_schedule: default_reconcile_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cleanup_schedule() -> String {
    // Every 15 minutes.
    "0 */15 * * * *".to_string()
}

fn default_reconcile_schedule() -> String {
    // Hourly.
    "0 0 * * * *".to_string()
}
