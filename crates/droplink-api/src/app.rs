//! Application builder — wires repositories, services, the blob store,
//! and the maintenance worker into a running Axum server.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use droplink_core::config::AppConfig;
use droplink_core::error::AppError;
use droplink_database::repositories::batch::BatchRepository;
use droplink_database::repositories::counter::WorkspaceUsageCounter;
use droplink_database::repositories::file::FileRepository;
use droplink_database::repositories::folder::FolderRepository;
use droplink_database::repositories::link::LinkRepository;
use droplink_database::repositories::permission::PermissionRepository;
use droplink_database::repositories::workspace::WorkspaceRepository;
use droplink_service::deletion::DeletionService;
use droplink_service::folder::FolderService;
use droplink_service::link::LinkService;
use droplink_service::notify::{NotificationDispatcher, TracingNotifier};
use droplink_service::permission::PermissionResolver;
use droplink_service::quota::QuotaService;
use droplink_service::upload::UploadService;
use droplink_service::workspace::WorkspaceService;
use droplink_worker::MaintenanceScheduler;
use droplink_worker::jobs::{CleanupJob, ReconcileJob};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application from pre-wired state.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the Droplink server with the given configuration and database
/// pool. Blocks until shutdown.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    tracing::info!("Starting Droplink server...");

    let config = Arc::new(config);

    // ── Blob store ───────────────────────────────────────────────
    let blob = droplink_storage::build_blob_store(&config.storage).await?;

    // ── Repositories ─────────────────────────────────────────────
    let workspace_repo = Arc::new(WorkspaceRepository::new(db_pool.clone()));
    let link_repo = Arc::new(LinkRepository::new(db_pool.clone()));
    let permission_repo = Arc::new(PermissionRepository::new(db_pool.clone()));
    let folder_repo = Arc::new(FolderRepository::new(db_pool.clone()));
    let file_repo = Arc::new(FileRepository::new(db_pool.clone()));
    let batch_repo = Arc::new(BatchRepository::new(db_pool.clone()));
    let counter = Arc::new(WorkspaceUsageCounter::new(db_pool.clone()));

    // ── Services ─────────────────────────────────────────────────
    let notifications = NotificationDispatcher::new(Arc::new(TracingNotifier::new()));
    let quota_service = Arc::new(QuotaService::new(
        Arc::clone(&workspace_repo),
        counter.clone(),
        config.quota.clone(),
    ));
    let link_service = Arc::new(LinkService::new(
        Arc::clone(&link_repo),
        Arc::clone(&folder_repo),
        Arc::clone(&workspace_repo),
        notifications.clone(),
    ));
    let workspace_service = Arc::new(WorkspaceService::new(
        Arc::clone(&workspace_repo),
        Arc::clone(&link_repo),
        Arc::clone(&link_service),
        config.quota.clone(),
    ));
    let folder_service = Arc::new(FolderService::new(
        Arc::clone(&folder_repo),
        Arc::clone(&file_repo),
    ));
    let upload_service = Arc::new(UploadService::new(
        Arc::clone(&file_repo),
        Arc::clone(&folder_repo),
        Arc::clone(&link_repo),
        Arc::clone(&batch_repo),
        Arc::clone(&workspace_repo),
        Arc::clone(&permission_repo),
        Arc::clone(&blob),
        Arc::clone(&quota_service),
        notifications.clone(),
        config.storage.clone(),
    ));
    let deletion_service = Arc::new(DeletionService::new(
        Arc::clone(&file_repo),
        Arc::clone(&folder_repo),
        Arc::clone(&link_repo),
        Arc::clone(&blob),
        Arc::clone(&quota_service),
    ));
    let permission_resolver = Arc::new(PermissionResolver::new(Arc::clone(&permission_repo)));

    // ── Maintenance worker ───────────────────────────────────────
    let cleanup = CleanupJob::new(Arc::clone(&file_repo), Arc::clone(&blob));
    let reconcile = ReconcileJob::new(Arc::clone(&workspace_repo), counter);
    let scheduler = MaintenanceScheduler::new(config.worker.clone(), cleanup, reconcile).await?;
    scheduler.start().await?;

    let state = AppState {
        config: Arc::clone(&config),
        db_pool,
        blob,
        workspace_repo,
        link_repo,
        file_repo,
        workspace_service,
        link_service,
        folder_service,
        upload_service,
        deletion_service,
        quota_service,
        permission_resolver,
    };

    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Droplink server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
