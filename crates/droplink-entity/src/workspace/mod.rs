//! Workspace entity.

pub mod model;

pub use model::{CreateWorkspace, Workspace};
