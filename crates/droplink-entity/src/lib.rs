//! # droplink-entity
//!
//! Domain entity models for Droplink: workspaces, links, permissions,
//! folders, files, and upload batches, together with the pure validators
//! that guard their structural invariants (ownership context and
//! upload-tracking shape).
//!
//! Everything here is plain data plus pure functions; all I/O lives in
//! `droplink-database` and `droplink-storage`.

pub mod batch;
pub mod context;
pub mod file;
pub mod folder;
pub mod link;
pub mod permission;
pub mod workspace;

pub use context::Context;
pub use file::upload_kind::UploadKind;
