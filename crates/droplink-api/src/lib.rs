//! # droplink-api
//!
//! HTTP API layer for Droplink built on Axum.
//!
//! Provides all REST endpoints, extractors, DTOs, and the mapping from
//! domain errors to HTTP responses. The public upload surface (slug
//! resolution, batches, resumable sessions) is unauthenticated; owner
//! endpoints identify the caller from the request.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
