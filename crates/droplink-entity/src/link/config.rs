//! Link configuration value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Behavioral configuration stored as JSON on a link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkConfig {
    /// When the link stops accepting uploads (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Argon2 hash of the link password, if password-protected.
    pub password_hash: Option<String>,
    /// Whether the owner is notified after each completed batch.
    #[serde(default)]
    pub notify_on_upload: bool,
}

impl LinkConfig {
    /// Whether the link has expired at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether the link requires a password.
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Presentation branding stored as JSON on a link. Opaque to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Branding {
    /// Display title shown on the public upload page.
    pub title: Option<String>,
    /// Accent color (hex).
    pub color: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let config = LinkConfig {
            expires_at: Some(Utc::now() - chrono::Duration::minutes(1)),
            ..Default::default()
        };
        assert!(config.is_expired(Utc::now()));

        let config = LinkConfig::default();
        assert!(!config.is_expired(Utc::now()));
    }
}
