//! Folder handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;
use validator::Validate;

use droplink_core::error::AppError;
use droplink_entity::context::Context;
use droplink_entity::folder::Folder;
use droplink_entity::permission::PermissionRole;
use droplink_service::RequestContext;
use droplink_service::folder::CreateFolderRequest;

use crate::dto::request::{CreateFolderBody, RenameFolderBody};
use crate::dto::response::FolderDeleteResponse;
use crate::error::ApiError;
use crate::extractors::{PaginationParams, Principal};
use crate::state::AppState;

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Json(body): Json<CreateFolderBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let context = Context::from_columns(body.workspace_id, body.link_id)?;
    require_context_access(&state, &ctx, context).await?;

    let folder = state
        .folder_service
        .create_folder(CreateFolderRequest {
            name: body.name,
            parent_folder_id: body.parent_folder_id,
            context,
        })
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": folder })))
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let folder = require_folder_access(&state, &ctx, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": folder })))
}

/// GET /api/folders/{id}/children
pub async fn list_children(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_folder_access(&state, &ctx, id).await?;
    let children = state.folder_service.list_subfolders(id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": children }),
    ))
}

/// GET /api/folders/{id}/files
pub async fn list_files(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_folder_access(&state, &ctx, id).await?;
    let page = params.into_page_request();
    let result = state.folder_service.list_files(id, &page).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": result })))
}

/// PUT /api/folders/{id}
pub async fn rename_folder(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameFolderBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    require_folder_access(&state, &ctx, id).await?;
    let folder = state.folder_service.rename_folder(id, &body.name).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": folder })))
}

/// DELETE /api/folders/{id}
///
/// Never touches the blob store: files in the subtree are detached and
/// keep their blobs.
pub async fn delete_folder(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_folder_access(&state, &ctx, id).await?;
    let detached_count = state.deletion_service.delete_folder(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": FolderDeleteResponse { detached_count }
    })))
}

/// Load a folder and require the caller to have access to its scope.
async fn require_folder_access(
    state: &AppState,
    ctx: &RequestContext,
    folder_id: Uuid,
) -> Result<Folder, AppError> {
    let folder = state.folder_service.get_folder(folder_id).await?;
    let context = Context::from_columns(folder.workspace_id, folder.link_id)?;
    require_context_access(state, ctx, context).await?;
    Ok(folder)
}

/// Workspace scopes require ownership; link scopes require at least a
/// verified editor grant.
async fn require_context_access(
    state: &AppState,
    ctx: &RequestContext,
    context: Context,
) -> Result<(), AppError> {
    match context {
        Context::Workspace(workspace_id) => {
            super::workspace::require_owned(state, ctx, workspace_id).await?;
        }
        Context::Link(link_id) => {
            state
                .permission_resolver
                .require_role(ctx, link_id, PermissionRole::Editor)
                .await?;
        }
    }
    Ok(())
}
