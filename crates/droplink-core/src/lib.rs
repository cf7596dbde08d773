//! # droplink-core
//!
//! Core crate for Droplink. Contains configuration schemas, the unified
//! error system, pagination types, and the traits that decouple the
//! consistency engine from its external collaborators (blob store,
//! notification sender, usage counter).
//!
//! This crate has **no** internal dependencies on other Droplink crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
