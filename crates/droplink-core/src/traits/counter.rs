//! Storage usage counter interface.
//!
//! The per-workspace byte counter is the one piece of explicitly shared
//! mutable state in the engine. It is only ever touched through atomic
//! increments behind this trait, never read-modify-write at the
//! application layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;

/// The side of an adjustment, used to build the idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageOperation {
    /// A confirmed upload added bytes.
    Upload,
    /// A confirmed deletion removed bytes.
    Delete,
}

impl UsageOperation {
    /// Stable string form used in the idempotency ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Delete => "delete",
        }
    }
}

/// Atomic per-workspace usage counter.
#[async_trait]
pub trait UsageCounter: Send + Sync + std::fmt::Debug + 'static {
    /// Atomically add `delta_bytes` (negative for deletions) to the
    /// workspace counter.
    ///
    /// Idempotent per `(operation, file_id)`: replaying the same
    /// adjustment is a no-op, so retries after partial failures are safe.
    async fn adjust(
        &self,
        workspace_id: Uuid,
        delta_bytes: i64,
        operation: UsageOperation,
        file_id: Uuid,
    ) -> AppResult<()>;

    /// Read the current counter value.
    async fn current(&self, workspace_id: Uuid) -> AppResult<i64>;

    /// Recompute the counter from the sum of live file rows and return
    /// the correction that was applied.
    async fn reconcile(&self, workspace_id: Uuid) -> AppResult<i64>;
}
