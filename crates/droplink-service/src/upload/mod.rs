//! Upload admission, name reservation, and deposit flows.

pub mod naming;
pub mod service;

pub use service::UploadService;
