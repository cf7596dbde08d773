//! Link lifecycle: creation, folder sharing, deactivation, removal.

pub mod password;
pub mod service;
pub mod slug;

pub use password::LinkPasswordHasher;
pub use service::{CreateLinkRequest, LinkService};
