//! Upload-tracking shapes for file rows.
//!
//! A file row may take exactly three shapes, depending on how the file
//! entered the system. The storage layer represents this as three
//! nullable columns; this tagged union is the application-boundary form
//! so shape checks live in one place instead of at every call site.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;

use crate::context::Context;

/// The three legal file-row shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadKind {
    /// Owner uploaded into their own workspace. No batch.
    Personal {
        /// The owning workspace.
        workspace_id: Uuid,
    },
    /// External uploader deposited through a base or custom link.
    LinkUpload {
        /// The link the file arrived through.
        link_id: Uuid,
        /// The upload session batch.
        batch_id: Uuid,
    },
    /// External uploader deposited through a generated link; the file
    /// lands directly in the owner's workspace.
    GeneratedLinkUpload {
        /// The owning workspace.
        workspace_id: Uuid,
        /// The upload session batch.
        batch_id: Uuid,
    },
}

impl UploadKind {
    /// Build the shape from the nullable column triple, rejecting any
    /// combination outside the three allowed shapes.
    pub fn from_columns(
        workspace_id: Option<Uuid>,
        link_id: Option<Uuid>,
        batch_id: Option<Uuid>,
    ) -> AppResult<Self> {
        match (workspace_id, link_id, batch_id) {
            (Some(w), None, None) => Ok(Self::Personal { workspace_id: w }),
            (None, Some(l), Some(b)) => Ok(Self::LinkUpload {
                link_id: l,
                batch_id: b,
            }),
            (Some(w), None, Some(b)) => Ok(Self::GeneratedLinkUpload {
                workspace_id: w,
                batch_id: b,
            }),
            (w, l, b) => Err(AppError::validation(format!(
                "Invalid upload shape: workspace={} link={} batch={}",
                w.is_some(),
                l.is_some(),
                b.is_some()
            ))),
        }
    }

    /// Decompose into the nullable column triple.
    pub fn into_columns(self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match self {
            Self::Personal { workspace_id } => (Some(workspace_id), None, None),
            Self::LinkUpload { link_id, batch_id } => (None, Some(link_id), Some(batch_id)),
            Self::GeneratedLinkUpload {
                workspace_id,
                batch_id,
            } => (Some(workspace_id), None, Some(batch_id)),
        }
    }

    /// The ownership context implied by the shape.
    pub fn context(&self) -> Context {
        match self {
            Self::Personal { workspace_id } | Self::GeneratedLinkUpload { workspace_id, .. } => {
                Context::Workspace(*workspace_id)
            }
            Self::LinkUpload { link_id, .. } => Context::Link(*link_id),
        }
    }

    /// The batch id, if the file arrived through a link.
    pub fn batch_id(&self) -> Option<Uuid> {
        match self {
            Self::Personal { .. } => None,
            Self::LinkUpload { batch_id, .. } | Self::GeneratedLinkUpload { batch_id, .. } => {
                Some(*batch_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_legal_shapes() {
        let w = Uuid::new_v4();
        let l = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(matches!(
            UploadKind::from_columns(Some(w), None, None).unwrap(),
            UploadKind::Personal { .. }
        ));
        assert!(matches!(
            UploadKind::from_columns(None, Some(l), Some(b)).unwrap(),
            UploadKind::LinkUpload { .. }
        ));
        assert!(matches!(
            UploadKind::from_columns(Some(w), None, Some(b)).unwrap(),
            UploadKind::GeneratedLinkUpload { .. }
        ));
    }

    #[test]
    fn test_illegal_shapes_rejected() {
        let w = Uuid::new_v4();
        let l = Uuid::new_v4();
        let b = Uuid::new_v4();

        // Link upload without a batch.
        assert!(UploadKind::from_columns(None, Some(l), None).is_err());
        // Both contexts set.
        assert!(UploadKind::from_columns(Some(w), Some(l), Some(b)).is_err());
        assert!(UploadKind::from_columns(Some(w), Some(l), None).is_err());
        // No context at all.
        assert!(UploadKind::from_columns(None, None, None).is_err());
        assert!(UploadKind::from_columns(None, None, Some(b)).is_err());
    }

    #[test]
    fn test_column_round_trip() {
        let kind = UploadKind::GeneratedLinkUpload {
            workspace_id: Uuid::new_v4(),
            batch_id: Uuid::new_v4(),
        };
        let (w, l, b) = kind.into_columns();
        assert_eq!(UploadKind::from_columns(w, l, b).unwrap(), kind);
    }

    #[test]
    fn test_context_projection() {
        let w = Uuid::new_v4();
        let l = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(
            UploadKind::Personal { workspace_id: w }.context(),
            Context::Workspace(w)
        );
        assert_eq!(
            UploadKind::LinkUpload {
                link_id: l,
                batch_id: b
            }
            .context(),
            Context::Link(l)
        );
    }
}
