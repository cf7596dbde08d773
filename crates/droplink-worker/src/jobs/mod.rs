//! Maintenance job implementations.

pub mod cleanup;
pub mod reconcile;

pub use cleanup::CleanupJob;
pub use reconcile::ReconcileJob;
