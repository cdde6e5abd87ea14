use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::document::{DocumentListResponse, DocumentResponse};
use crate::services::document::{DocumentService, delete_document as delete};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/documents",
    tag = "Documents",
    operation_id = "listDocuments",
    summary = "List the current user's documents",
    responses(
        (status = 200, description = "Documents, newest first", body = DocumentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_documents(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let rows = DocumentService::new(&state.db)
        .list_for_user(auth_user.user_id)
        .await?;

    let documents = rows
        .into_iter()
        .map(|(doc, file)| {
            DocumentResponse::new(doc, file, &state.disks, &state.config.upload.app_url)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DocumentListResponse {
        total: documents.len() as u64,
        documents,
    }))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "Documents",
    operation_id = "deleteDocument",
    summary = "Delete a document and its file",
    description = "Removes the document, its file record and the stored bytes.",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Document belongs to another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let doc = DocumentService::new(&state.db)
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

    if doc.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }

    delete(&state.db, &state.disks, &doc).await?;
    Ok(StatusCode::NO_CONTENT)
}
