//! File handlers: lookup and deletion.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;
use validator::Validate;

use droplink_core::error::AppError;
use droplink_entity::file::File;
use droplink_service::RequestContext;

use crate::dto::request::BulkDeleteBody;
use crate::dto::response::BulkDeleteResponse;
use crate::error::ApiError;
use crate::extractors::Principal;
use crate::state::AppState;

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let file = require_file_ownership(&state, &ctx, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_file_ownership(&state, &ctx, id).await?;
    state.deletion_service.delete_file(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "message": "File deleted" }
    })))
}

/// POST /api/files/bulk-delete
pub async fn bulk_delete(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Json(body): Json<BulkDeleteBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // Ownership is checked up front for every row that exists; ids
    // that resolve to nothing fall through to the service, which
    // reports them in failed_ids rather than failing the batch.
    for file_id in &body.file_ids {
        if let Some(file) = state.file_repo.find_by_id(*file_id).await? {
            require_ownership_of(&state, &ctx, &file).await?;
        }
    }

    let outcome = state.deletion_service.bulk_delete(&body.file_ids).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": BulkDeleteResponse {
            deleted_count: outcome.deleted_count,
            failed_ids: outcome.failed_ids,
        }
    })))
}

/// Load a file and require the caller to own the workspace it counts
/// against.
async fn require_file_ownership(
    state: &AppState,
    ctx: &RequestContext,
    file_id: Uuid,
) -> Result<File, AppError> {
    let file = state
        .file_repo
        .find_by_id(file_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
    require_ownership_of(state, ctx, &file).await?;
    Ok(file)
}

/// Resolve the owning workspace of a file row (through its link for
/// link uploads) and require the caller to own it.
async fn require_ownership_of(
    state: &AppState,
    ctx: &RequestContext,
    file: &File,
) -> Result<(), AppError> {
    let workspace_id = match (file.workspace_id, file.link_id) {
        (Some(workspace_id), _) => workspace_id,
        (None, Some(link_id)) => {
            state
                .link_repo
                .find_by_id(link_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Link {link_id} not found")))?
                .workspace_id
        }
        (None, None) => {
            return Err(AppError::internal(format!(
                "File {} has no owning context",
                file.id
            )));
        }
    };
    super::workspace::require_owned(state, ctx, workspace_id).await?;
    Ok(())
}
