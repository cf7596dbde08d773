//! Link entity model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of a share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "link_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// The default link every workspace starts with.
    Base,
    /// An owner-named link.
    Custom,
    /// Auto-created when an owner shares a specific workspace folder.
    /// At most one generated link may reference a given source folder.
    Generated,
}

impl LinkType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Custom => "custom",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = droplink_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "custom" => Ok(Self::Custom),
            "generated" => Ok(Self::Generated),
            _ => Err(droplink_core::AppError::validation(format!(
                "Invalid link type: '{s}'. Expected one of: base, custom, generated"
            ))),
        }
    }
}

/// A shareable endpoint through which external uploaders deposit files.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Link {
    /// Unique link identifier.
    pub id: Uuid,
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Globally unique slug used in the public URL.
    pub slug: String,
    /// The link kind.
    pub link_type: LinkType,
    /// Whether the link currently accepts uploads.
    pub is_active: bool,
    /// Whether the link is listed publicly.
    pub is_public: bool,
    /// Behavioral configuration (expiry, password hash, notification flag).
    pub link_config: serde_json::Value,
    /// Presentation branding (opaque to the engine).
    pub branding: serde_json::Value,
    /// For generated links: the workspace folder being shared.
    pub source_folder_id: Option<Uuid>,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
    /// When the link was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Deserialize the typed link configuration.
    pub fn config(&self) -> droplink_core::AppResult<super::LinkConfig> {
        serde_json::from_value(self.link_config.clone()).map_err(Into::into)
    }
}

/// Data required to create a new link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLink {
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Globally unique slug.
    pub slug: String,
    /// The link kind.
    pub link_type: LinkType,
    /// Whether the link is listed publicly.
    pub is_public: bool,
    /// Behavioral configuration.
    pub link_config: serde_json::Value,
    /// Presentation branding.
    pub branding: serde_json::Value,
    /// For generated links: the workspace folder being shared.
    pub source_folder_id: Option<Uuid>,
}
