//! Quota accounting and upload rate limiting.

pub mod service;

pub use service::{QuotaService, QuotaStatus};
