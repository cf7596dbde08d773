//! Workspace handlers: onboarding, lookup, quota.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;
use validator::Validate;

use droplink_core::error::AppError;
use droplink_entity::workspace::Workspace;
use droplink_service::RequestContext;

use crate::dto::request::UpdateLimitBody;
use crate::error::ApiError;
use crate::extractors::Principal;
use crate::state::AppState;

/// POST /api/workspaces — onboard the caller.
pub async fn onboard(
    State(state): State<AppState>,
    Principal(ctx): Principal,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (workspace, base_link) = state.workspace_service.onboard(&ctx).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "workspace": workspace, "base_link": base_link }
    })))
}

/// GET /api/workspaces/me
pub async fn me(
    State(state): State<AppState>,
    Principal(ctx): Principal,
) -> Result<Json<serde_json::Value>, ApiError> {
    let workspace = state.workspace_service.find_own(&ctx).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": workspace }),
    ))
}

/// GET /api/workspaces/{id}
pub async fn get_workspace(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let workspace = require_owned(&state, &ctx, id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": workspace }),
    ))
}

/// GET /api/workspaces/{id}/links
pub async fn list_links(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_owned(&state, &ctx, id).await?;
    let links = state.workspace_service.list_links(id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": links })))
}

/// GET /api/workspaces/{id}/quota
pub async fn quota_status(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_owned(&state, &ctx, id).await?;
    let status = state.quota_service.status(id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": status })))
}

/// GET /api/workspaces/{id}/folders
pub async fn list_root_folders(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_owned(&state, &ctx, id).await?;
    let folders = state.folder_service.list_workspace_roots(id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": folders })))
}

/// PUT /api/workspaces/{id}/limit
pub async fn update_limit(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLimitBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    require_owned(&state, &ctx, id).await?;
    let workspace = state
        .workspace_service
        .change_limit(id, body.storage_limit_bytes)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": workspace }),
    ))
}

/// Load a workspace and require the caller to own it.
pub(crate) async fn require_owned(
    state: &AppState,
    ctx: &RequestContext,
    workspace_id: Uuid,
) -> Result<Workspace, AppError> {
    let email = ctx.require_email()?;
    let workspace = state
        .workspace_repo
        .find_by_id(workspace_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Workspace {workspace_id} not found")))?;
    if workspace.owner_email != email {
        return Err(AppError::forbidden("Workspace belongs to another owner"));
    }
    Ok(workspace)
}
