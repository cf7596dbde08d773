//! Permission entity — per-link role grants.

pub mod model;

pub use model::{CreatePermission, Permission, PermissionRole};
