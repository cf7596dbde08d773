//! Deletion protocol: blob first, database second.

pub mod service;

pub use service::{BulkDeleteOutcome, DeletionService};
