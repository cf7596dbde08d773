//! Link entity — shareable upload endpoints.

pub mod config;
pub mod model;

pub use config::{Branding, LinkConfig};
pub use model::{CreateLink, Link, LinkType};
