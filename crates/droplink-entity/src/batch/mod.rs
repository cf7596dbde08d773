//! Batch entity — one external upload session.

pub mod model;

pub use model::{Batch, CreateBatch};
