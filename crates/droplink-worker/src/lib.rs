//! Scheduled maintenance tasks for Droplink.
//!
//! Two periodic jobs keep the database and blob store convergent:
//! cleanup (orphaned rows and expired upload sessions) and counter
//! reconciliation.

pub mod jobs;
pub mod scheduler;

pub use scheduler::MaintenanceScheduler;
