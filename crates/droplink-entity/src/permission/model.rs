//! Permission entity model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Roles grantable on a link.
///
/// Roles are ordered by privilege level: Owner > Editor > Uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "permission_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionRole {
    /// Full control. Exactly one owner grant exists per link.
    Owner,
    /// Can organize and delete uploaded content.
    Editor,
    /// Can only deposit files.
    Uploader,
}

impl PermissionRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Editor => 2,
            Self::Uploader => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &PermissionRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Uploader => "uploader",
        }
    }
}

impl fmt::Display for PermissionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PermissionRole {
    type Err = droplink_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "editor" => Ok(Self::Editor),
            "uploader" => Ok(Self::Uploader),
            _ => Err(droplink_core::AppError::validation(format!(
                "Invalid permission role: '{s}'. Expected one of: owner, editor, uploader"
            ))),
        }
    }
}

/// A role grant binding an email address to a link.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: Uuid,
    /// The link this grant applies to.
    pub link_id: Uuid,
    /// The grantee's email address.
    pub email: String,
    /// The granted role.
    pub role: PermissionRole,
    /// Whether the grantee has confirmed the email address.
    pub is_verified: bool,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new permission grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    /// The link this grant applies to.
    pub link_id: Uuid,
    /// The grantee's email address.
    pub email: String,
    /// The granted role.
    pub role: PermissionRole,
    /// Whether the grant starts verified (owner grants do).
    pub is_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(PermissionRole::Owner.has_at_least(&PermissionRole::Uploader));
        assert!(PermissionRole::Owner.has_at_least(&PermissionRole::Owner));
        assert!(PermissionRole::Editor.has_at_least(&PermissionRole::Uploader));
        assert!(!PermissionRole::Uploader.has_at_least(&PermissionRole::Editor));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "owner".parse::<PermissionRole>().unwrap(),
            PermissionRole::Owner
        );
        assert_eq!(
            "UPLOADER".parse::<PermissionRole>().unwrap(),
            PermissionRole::Uploader
        );
        assert!("admin".parse::<PermissionRole>().is_err());
    }
}
