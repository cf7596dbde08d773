//! Owner-facing link management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;
use validator::Validate;

use droplink_core::error::AppError;
use droplink_entity::permission::PermissionRole;
use droplink_service::link::CreateLinkRequest;

use crate::dto::request::{CreateLinkBody, InviteEditorBody, ShareFolderBody};
use crate::error::ApiError;
use crate::extractors::Principal;
use crate::state::AppState;

/// POST /api/links
pub async fn create_link(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Json(body): Json<CreateLinkBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let link = state
        .link_service
        .create_link_with_root_folder(
            &ctx,
            CreateLinkRequest {
                workspace_id: body.workspace_id,
                slug: body.slug,
                link_type: body.link_type,
                is_public: body.is_public,
                password: body.password,
                expires_at: body.expires_at,
                notify_on_upload: body.notify_on_upload,
                branding: body.branding,
                editor_emails: body.editor_emails,
            },
        )
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": link })))
}

/// GET /api/links/slug-check?slug=...
pub async fn slug_check(
    State(state): State<AppState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let slug = params
        .get("slug")
        .ok_or_else(|| AppError::validation("slug query parameter is required"))?;
    let available = state.link_service.slug_available(slug).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "slug": slug, "available": available }
    })))
}

/// POST /api/links/share-folder
pub async fn share_folder(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Json(body): Json<ShareFolderBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let link = state
        .link_service
        .link_existing_folder(
            &ctx,
            body.folder_id,
            body.existing_link_id,
            &body.editor_emails,
        )
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": link })))
}

/// GET /api/links/{id}/permissions
pub async fn list_permissions(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .permission_resolver
        .require_role(&ctx, id, PermissionRole::Owner)
        .await?;
    let grants = state.permission_resolver.resolve(id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": grants })))
}

/// POST /api/links/{id}/permissions
pub async fn invite_editor(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<InviteEditorBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let grant = state
        .permission_resolver
        .invite_editor(&ctx, id, &body.email)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": grant })))
}

/// POST /api/links/{id}/permissions/confirm
pub async fn confirm_permission(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let grant = state.permission_resolver.confirm_grant(&ctx, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": grant })))
}

/// DELETE /api/links/{id}/permissions/{permission_id}
pub async fn revoke_permission(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path((id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .permission_resolver
        .revoke_grant(&ctx, id, permission_id)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "message": "Permission revoked" }
    })))
}

/// POST /api/links/{id}/deactivate
pub async fn deactivate_link(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let link = state.link_service.deactivate(&ctx, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": link })))
}

/// DELETE /api/links/{id}
pub async fn remove_link(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.link_service.remove(&ctx, id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "message": "Link removed; its content was moved to the workspace" }
    })))
}
