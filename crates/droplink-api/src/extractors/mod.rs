//! Custom Axum extractors.

pub mod pagination;
pub mod principal;

pub use pagination::PaginationParams;
pub use principal::Principal;
