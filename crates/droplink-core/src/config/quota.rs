//! Quota accounting configuration.

use serde::{Deserialize, Serialize};

/// Quota accounting and upload rate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Default per-workspace storage limit in bytes (default 10 GB).
    #[serde(default = "default_limit_bytes")]
    pub default_limit_bytes: i64,
    /// How long a cached usage counter may serve checks before a fresh
    /// read is forced, in seconds.
    #[serde(default = "default_staleness")]
    pub counter_staleness_seconds: u64,
    /// Sliding window length for upload rate limiting, in seconds.
    #[serde(default = "default_window")]
    pub rate_window_seconds: u64,
    /// Maximum uploads admitted per workspace inside the window.
    #[serde(default = "default_max_uploads")]
    pub rate_max_uploads: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_limit_bytes: default_limit_bytes(),
            counter_staleness_seconds: default_staleness(),
            rate_window_seconds: default_window(),
            rate_max_uploads: default_max_uploads(),
        }
    }
}

fn default_limit_bytes() -> i64 {
    10_737_418_240 // 10 GB
}

fn default_staleness() -> u64 {
    120
}

fn default_window() -> u64 {
    60
}

fn default_max_uploads() -> u32 {
    30
}
