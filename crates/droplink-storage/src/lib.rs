//! Blob store providers for Droplink.
//!
//! Implements the [`BlobStore`](droplink_core::traits::BlobStore) trait
//! for the local filesystem and an in-memory store, plus the resumable
//! session registry both providers share.

pub mod factory;
pub mod providers;
pub mod resumable;

pub use factory::build_blob_store;
pub use providers::local::LocalBlobStore;
pub use providers::memory::MemoryBlobStore;
