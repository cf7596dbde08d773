//! Workspace entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An owner's private workspace — the root namespace for personal content.
///
/// Created once at onboarding. The `storage_used_bytes` column is the
/// per-owner usage counter; it is adjusted only through atomic SQL
/// increments and reconciled asynchronously against the sum of live file
/// rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workspace {
    /// Unique workspace identifier.
    pub id: Uuid,
    /// The owner's email address.
    pub owner_email: String,
    /// Running storage usage in bytes (eventually consistent).
    pub storage_used_bytes: i64,
    /// Plan storage limit in bytes.
    pub storage_limit_bytes: i64,
    /// When the workspace was created.
    pub created_at: DateTime<Utc>,
    /// When the workspace was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Whether adding `incoming_bytes` would exceed the plan limit.
    pub fn would_exceed(&self, incoming_bytes: i64) -> bool {
        self.storage_used_bytes + incoming_bytes > self.storage_limit_bytes
    }
}

/// Data required to create a new workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspace {
    /// The owner's email address.
    pub owner_email: String,
    /// Plan storage limit in bytes.
    pub storage_limit_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_would_exceed() {
        let ws = Workspace {
            id: Uuid::new_v4(),
            owner_email: "owner@example.com".to_string(),
            storage_used_bytes: 900,
            storage_limit_bytes: 1000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!ws.would_exceed(100));
        assert!(ws.would_exceed(101));
    }
}
