//! Repository implementations, one per table.

pub mod batch;
pub mod counter;
pub mod file;
pub mod folder;
pub mod link;
pub mod permission;
pub mod workspace;
