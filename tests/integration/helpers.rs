//! Shared test helpers for integration tests.

use sqlx::PgPool;
use uuid::Uuid;

use droplink_core::config::DatabaseConfig;
use droplink_database::connection::DatabasePool;
use droplink_database::repositories::workspace::WorkspaceRepository;
use droplink_entity::workspace::{CreateWorkspace, Workspace};

/// Connect to the test database named in `DROPLINK_TEST_DATABASE_URL`,
/// running migrations first. Returns `None` when the variable is unset
/// so callers can skip.
pub async fn test_pool() -> Option<PgPool> {
    let config = DatabaseConfig {
        url: std::env::var("DROPLINK_TEST_DATABASE_URL").ok()?,
        max_connections: 5,
        min_connections: 1,
        connect_timeout_seconds: 10,
        idle_timeout_seconds: 60,
    };
    let db = DatabasePool::connect(&config)
        .await
        .expect("Failed to connect to test database");
    db.migrate().await.expect("Failed to run migrations");
    Some(db.into_pool())
}

/// A unique owner email per test run, so tests never collide on the
/// workspace owner uniqueness constraint.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

/// Create a workspace with a 1 GiB limit.
pub async fn create_workspace(pool: &PgPool, prefix: &str) -> Workspace {
    WorkspaceRepository::new(pool.clone())
        .create(&CreateWorkspace {
            owner_email: unique_email(prefix),
            storage_limit_bytes: 1024 * 1024 * 1024,
        })
        .await
        .expect("Failed to create workspace")
}

/// A unique slug per test run.
pub fn unique_slug(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..12])
}
