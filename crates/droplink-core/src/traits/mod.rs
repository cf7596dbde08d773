//! Traits decoupling the consistency engine from external collaborators.

pub mod blob;
pub mod counter;
pub mod notifier;

pub use blob::{BlobMeta, BlobStore, ByteStream, UploadSession};
pub use counter::{UsageCounter, UsageOperation};
pub use notifier::{Notification, Notifier};
