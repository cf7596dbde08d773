//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Blob provider to use: `"local"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Maximum upload size in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Chunk size in bytes for resumable uploads (default 5 MB).
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,
    /// Lifetime of a resumable session before it is considered abandoned.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,
    /// Maximum numbered-name collision attempts before falling back to a
    /// timestamp suffix.
    #[serde(default = "default_dedup_attempts")]
    pub max_dedup_attempts: u32,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_upload_size_bytes: default_max_upload(),
            chunk_size_bytes: default_chunk_size(),
            session_ttl_hours: default_session_ttl(),
            max_dedup_attempts: default_dedup_attempts(),
            local: LocalStorageConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local blob storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}

fn default_chunk_size() -> u64 {
    5_242_880 // 5 MB
}

fn default_session_ttl() -> i64 {
    24
}

fn default_dedup_attempts() -> u32 {
    1000
}

fn default_local_root() -> String {
    "./data/storage/local".to_string()
}
