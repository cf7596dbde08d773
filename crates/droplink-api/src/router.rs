//! Route definitions for the Droplink HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.storage.max_upload_size_bytes as usize;

    let api_routes = Router::new()
        .merge(workspace_routes())
        .merge(link_routes())
        .merge(drop_routes())
        .merge(upload_routes())
        .merge(file_routes())
        .merge(folder_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Workspace onboarding, lookup, quota
fn workspace_routes() -> Router<AppState> {
    Router::new()
        .route("/workspaces", post(handlers::workspace::onboard))
        .route("/workspaces/me", get(handlers::workspace::me))
        .route("/workspaces/{id}", get(handlers::workspace::get_workspace))
        .route(
            "/workspaces/{id}/links",
            get(handlers::workspace::list_links),
        )
        .route(
            "/workspaces/{id}/quota",
            get(handlers::workspace::quota_status),
        )
        .route(
            "/workspaces/{id}/folders",
            get(handlers::workspace::list_root_folders),
        )
        .route(
            "/workspaces/{id}/limit",
            put(handlers::workspace::update_limit),
        )
        .route(
            "/workspaces/{id}/files",
            post(handlers::upload::upload_personal),
        )
}

/// Owner-facing link management
fn link_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(handlers::link::create_link))
        .route("/links/slug-check", get(handlers::link::slug_check))
        .route("/links/share-folder", post(handlers::link::share_folder))
        .route(
            "/links/{id}/permissions",
            get(handlers::link::list_permissions).post(handlers::link::invite_editor),
        )
        .route(
            "/links/{id}/permissions/confirm",
            post(handlers::link::confirm_permission),
        )
        .route(
            "/links/{id}/permissions/{permission_id}",
            delete(handlers::link::revoke_permission),
        )
        .route(
            "/links/{id}/deactivate",
            post(handlers::link::deactivate_link),
        )
        .route("/links/{id}", delete(handlers::link::remove_link))
}

/// Public drop pages: slug resolution, password verification, batches
fn drop_routes() -> Router<AppState> {
    Router::new()
        .route("/drop/{slug}", get(handlers::drop::resolve_slug))
        .route("/drop/{slug}/verify", post(handlers::drop::verify_password))
        .route("/drop/{slug}/batches", post(handlers::drop::open_batch))
}

/// Batch deposits and resumable upload sessions
fn upload_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/batches/{id}/files",
            post(handlers::upload::deposit_into_batch),
        )
        .route(
            "/batches/{id}/complete",
            post(handlers::upload::complete_batch),
        )
        .route(
            "/batches/{id}/uploads",
            post(handlers::upload::initiate_resumable),
        )
        .route(
            "/uploads/{session_id}/chunks/{index}",
            put(handlers::upload::upload_chunk),
        )
        .route(
            "/uploads/{session_id}/complete",
            post(handlers::upload::complete_resumable),
        )
        .route(
            "/uploads/{session_id}",
            delete(handlers::upload::abort_resumable),
        )
}

/// File lookup and deletion
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files/{id}", get(handlers::file::get_file))
        .route("/files/{id}", delete(handlers::file::delete_file))
        .route("/files/bulk-delete", post(handlers::file::bulk_delete))
}

/// Folder CRUD
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", post(handlers::folder::create_folder))
        .route("/folders/{id}", get(handlers::folder::get_folder))
        .route("/folders/{id}", put(handlers::folder::rename_folder))
        .route("/folders/{id}", delete(handlers::folder::delete_folder))
        .route(
            "/folders/{id}/children",
            get(handlers::folder::list_children),
        )
        .route("/folders/{id}/files", get(handlers::folder::list_files))
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
