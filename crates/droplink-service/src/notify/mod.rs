//! Outbound notification dispatch.

pub mod service;

pub use service::{NotificationDispatcher, TracingNotifier};
