//! Public drop-page handlers: slug resolution, password verification,
//! batch opening.
//!
//! Everything here is reachable without a principal; this is the
//! surface external uploaders see.

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use droplink_core::error::AppError;
use droplink_entity::link::Link;

use crate::dto::request::{OpenBatchBody, VerifyPasswordBody};
use crate::dto::response::PublicLinkResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/drop/{slug}
pub async fn resolve_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let link = find_link(&state, &slug).await?;
    let view = PublicLinkResponse::from_link(&link)?;
    Ok(Json(serde_json::json!({ "success": true, "data": view })))
}

/// POST /api/drop/{slug}/verify
pub async fn verify_password(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<VerifyPasswordBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let link = find_link(&state, &slug).await?;
    let valid = state.link_service.verify_password(&link, &body.password)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "valid": valid }
    })))
}

/// POST /api/drop/{slug}/batches
pub async fn open_batch(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<OpenBatchBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let link = find_link(&state, &slug).await?;
    state
        .link_service
        .require_password(&link, body.password.as_deref())?;
    let batch = state
        .upload_service
        .open_batch(&link, &body.uploader_name, body.uploader_email.as_deref())
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": batch })))
}

/// A deactivated link is indistinguishable from a missing one on the
/// public surface.
async fn find_link(state: &AppState, slug: &str) -> Result<Link, AppError> {
    state
        .link_service
        .find_by_slug(slug)
        .await?
        .filter(|link| link.is_active)
        .ok_or_else(|| AppError::not_found(format!("No active link at '{slug}'")))
}
