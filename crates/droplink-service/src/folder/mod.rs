//! Folder organization operations.

pub mod service;

pub use service::{CreateFolderRequest, FolderService};
