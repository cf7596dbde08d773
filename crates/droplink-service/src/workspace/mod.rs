//! Workspace onboarding and quota status.

pub mod service;

pub use service::WorkspaceService;
