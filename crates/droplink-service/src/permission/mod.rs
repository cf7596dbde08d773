//! Permission resolution for link-scoped operations.

pub mod resolver;

pub use resolver::PermissionResolver;
