//! Upload handlers: personal uploads, batch deposits, resumable
//! sessions.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use bytes::Bytes;
use uuid::Uuid;
use validator::Validate;

use droplink_core::error::AppError;
use droplink_service::upload::service::{BatchDepositParams, PersonalUploadParams};

use crate::dto::request::InitiateUploadBody;
use crate::error::ApiError;
use crate::extractors::Principal;
use crate::state::AppState;

/// One file field pulled out of a multipart body.
struct UploadedPart {
    file_name: String,
    mime_type: Option<String>,
    data: Bytes,
    folder_id: Option<Uuid>,
}

/// POST /api/workspaces/{id}/files — owner upload into their own
/// workspace.
pub async fn upload_personal(
    State(state): State<AppState>,
    Principal(ctx): Principal,
    Path(workspace_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let part = read_upload_part(multipart).await?;

    let file = state
        .upload_service
        .upload_personal(
            &ctx,
            PersonalUploadParams {
                workspace_id,
                folder_id: part.folder_id,
                file_name: part.file_name,
                mime_type: part.mime_type,
                data: part.data,
            },
        )
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// POST /api/batches/{id}/files — external deposit into an open batch.
pub async fn deposit_into_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let part = read_upload_part(multipart).await?;

    let file = state
        .upload_service
        .deposit_into_batch(BatchDepositParams {
            batch_id,
            file_name: part.file_name,
            mime_type: part.mime_type,
            data: part.data,
        })
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// POST /api/batches/{id}/complete
pub async fn complete_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let files = state.upload_service.complete_batch(batch_id).await?;
    let file_count = files.len();
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "files": files, "file_count": file_count }
    })))
}

/// POST /api/batches/{id}/uploads — start a resumable upload.
pub async fn initiate_resumable(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(body): Json<InitiateUploadBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let session = state
        .upload_service
        .initiate_resumable(batch_id, &body.file_name, body.file_size, body.mime_type)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": session })))
}

/// PUT /api/uploads/{session_id}/chunks/{index}
pub async fn upload_chunk(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, u32)>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .upload_service
        .upload_chunk(session_id, index, body)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "session_id": session_id, "chunk_index": index }
    })))
}

/// POST /api/uploads/{session_id}/complete
pub async fn complete_resumable(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let file = state.upload_service.complete_resumable(session_id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// DELETE /api/uploads/{session_id}
pub async fn abort_resumable(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.upload_service.abort_resumable(session_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "message": "Upload aborted" }
    })))
}

/// Pull the file field (and optional folder_id) out of a multipart
/// body.
async fn read_upload_part(mut multipart: Multipart) -> Result<UploadedPart, AppError> {
    let mut folder_id: Option<Uuid> = None;
    let mut file_name: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "folder_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?;
                folder_id = Some(
                    text.parse::<Uuid>()
                        .map_err(|_| AppError::validation("Invalid folder_id"))?,
                );
            }
            "file" => {
                file_name = field.file_name().map(str::to_string);
                mime_type = field.content_type().map(str::to_string);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let file_name =
        file_name.ok_or_else(|| AppError::validation("Multipart field 'file' is required"))?;
    let data = data.ok_or_else(|| AppError::validation("Multipart field 'file' is empty"))?;

    Ok(UploadedPart {
        file_name,
        mime_type,
        data,
        folder_id,
    })
}
