//! Business logic services for Droplink.
//!
//! Each service orchestrates repositories, the blob store, and the
//! usage counter to implement one operation family: link creation,
//! upload admission and name reservation, deletion, quota accounting,
//! and permission resolution.

pub mod context;
pub mod deletion;
pub mod folder;
pub mod link;
pub mod notify;
pub mod permission;
pub mod quota;
pub mod upload;
pub mod workspace;

pub use context::RequestContext;
