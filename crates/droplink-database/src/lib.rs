//! # droplink-database
//!
//! PostgreSQL access layer: connection pool management, migrations, and
//! one repository per table. Multi-row creations that must appear atomic
//! (link + owner permission + root folder) are implemented as single
//! transactions inside [`repositories::link::LinkRepository`].

pub mod connection;
pub mod repositories;
