//! Folder entity — hierarchical nodes.

pub mod model;

pub use model::{CreateFolder, Folder};
