//! Ownership context validation.
//!
//! Every file and folder is owned by exactly one scope: a workspace
//! (personal content) or a link (shared content). The same rules are
//! enforced a second time by database triggers; this module is the
//! application half of that defense in depth.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;

/// The owning scope of a file or folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    /// Personal content inside a workspace.
    Workspace(Uuid),
    /// Shared content belonging to a link.
    Link(Uuid),
}

impl Context {
    /// Build a context from the nullable column pair, rejecting rows
    /// where both or neither identifier is set.
    pub fn from_columns(workspace_id: Option<Uuid>, link_id: Option<Uuid>) -> AppResult<Self> {
        match (workspace_id, link_id) {
            (Some(w), None) => Ok(Self::Workspace(w)),
            (None, Some(l)) => Ok(Self::Link(l)),
            (Some(_), Some(_)) => Err(AppError::validation(
                "Both workspace_id and link_id are set; exactly one is required",
            )),
            (None, None) => Err(AppError::validation(
                "Neither workspace_id nor link_id is set; exactly one is required",
            )),
        }
    }

    /// Decompose into the nullable column pair.
    pub fn into_columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Self::Workspace(w) => (Some(w), None),
            Self::Link(l) => (None, Some(l)),
        }
    }

    /// The workspace id, if this is a workspace context.
    pub fn workspace_id(&self) -> Option<Uuid> {
        match self {
            Self::Workspace(w) => Some(*w),
            Self::Link(_) => None,
        }
    }

    /// The link id, if this is a link context.
    pub fn link_id(&self) -> Option<Uuid> {
        match self {
            Self::Link(l) => Some(*l),
            Self::Workspace(_) => None,
        }
    }
}

/// Validate a candidate node context against its resolved parent.
///
/// A child must live in the same scope as its parent: same workspace or
/// same link. Root nodes (no parent) only need a well-formed context of
/// their own.
pub fn validate_child(candidate: Context, parent: Option<Context>) -> AppResult<()> {
    match parent {
        None => Ok(()),
        Some(p) if p == candidate => Ok(()),
        Some(p) => Err(AppError::validation(format!(
            "Context mismatch: candidate {candidate:?} does not match parent {p:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_identifier() {
        let w = Uuid::new_v4();
        let l = Uuid::new_v4();

        assert_eq!(
            Context::from_columns(Some(w), None).unwrap(),
            Context::Workspace(w)
        );
        assert_eq!(
            Context::from_columns(None, Some(l)).unwrap(),
            Context::Link(l)
        );
        assert!(Context::from_columns(Some(w), Some(l)).is_err());
        assert!(Context::from_columns(None, None).is_err());
    }

    #[test]
    fn test_child_inherits_parent_context() {
        let w = Uuid::new_v4();
        let ctx = Context::Workspace(w);

        assert!(validate_child(ctx, None).is_ok());
        assert!(validate_child(ctx, Some(ctx)).is_ok());
        assert!(validate_child(ctx, Some(Context::Workspace(Uuid::new_v4()))).is_err());
        assert!(validate_child(ctx, Some(Context::Link(Uuid::new_v4()))).is_err());
    }

    #[test]
    fn test_same_id_different_scope_rejected() {
        let id = Uuid::new_v4();
        assert!(validate_child(Context::Workspace(id), Some(Context::Link(id))).is_err());
    }

    #[test]
    fn test_column_round_trip() {
        let l = Uuid::new_v4();
        let ctx = Context::Link(l);
        let (ws, link) = ctx.into_columns();
        assert_eq!(Context::from_columns(ws, link).unwrap(), ctx);
    }
}
