//! Blob store construction from configuration.

use std::sync::Arc;

use tracing::info;

use droplink_core::config::StorageConfig;
use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::traits::BlobStore;

use crate::providers::local::LocalBlobStore;
use crate::providers::memory::MemoryBlobStore;

/// Build the configured blob store provider.
pub async fn build_blob_store(config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.provider.as_str() {
        "local" => {
            info!(root_path = %config.local.root_path, "Using local blob store");
            Arc::new(LocalBlobStore::new(&config.local.root_path).await?)
        }
        "memory" => {
            info!("Using in-memory blob store");
            Arc::new(MemoryBlobStore::new())
        }
        other => {
            return Err(AppError::configuration(format!(
                "Unknown storage provider: '{other}'. Expected one of: local, memory"
            )));
        }
    };
    Ok(store)
}
