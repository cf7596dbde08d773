//! File entity — leaf nodes with blob-backed content.

pub mod model;
pub mod upload_kind;

pub use model::{CreateFile, File};
pub use upload_kind::UploadKind;
