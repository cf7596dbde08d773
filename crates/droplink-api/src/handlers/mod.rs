//! HTTP request handlers, grouped by domain.

pub mod drop;
pub mod file;
pub mod folder;
pub mod health;
pub mod link;
pub mod upload;
pub mod workspace;
