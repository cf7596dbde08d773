//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use droplink_core::config::AppConfig;
use droplink_core::traits::blob::BlobStore;

use droplink_database::repositories::file::FileRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_database::repositories::workspace::WorkspaceRepository;

use droplink_service::deletion::DeletionService;
use droplink_service::folder::FolderService;
use droplink_service::link::LinkService;
use droplink_service::permission::PermissionResolver;
use droplink_service::quota::QuotaService;
use droplink_service::upload::UploadService;
use droplink_service::workspace::WorkspaceService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,

    /// PostgreSQL connection pool, held for health checks.
    pub db_pool: PgPool,
    /// Blob storage backend.
    pub blob: Arc<dyn BlobStore>,

    /// Repositories handlers hit directly for ownership lookups.
    pub workspace_repo: Arc<WorkspaceRepository>,
    pub link_repo: Arc<LinkRepository>,
    pub file_repo: Arc<FileRepository>,

    /// Domain services.
    pub workspace_service: Arc<WorkspaceService>,
    pub link_service: Arc<LinkService>,
    pub folder_service: Arc<FolderService>,
    pub upload_service: Arc<UploadService>,
    pub deletion_service: Arc<DeletionService>,
    pub quota_service: Arc<QuotaService>,
    pub permission_resolver: Arc<PermissionResolver>,
}
