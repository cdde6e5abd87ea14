use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::entity::file_record;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::file::{FileListResponse, FileResponse};
use crate::ownership::{DbOwnerResolver, OwnerRef, OwnerResolver};
use crate::services::file_record::FileRecordService;
use crate::state::AppState;

/// User-owned files are private to their owner; files of other domains are
/// readable by any signed-in user.
fn require_read_access(record: &file_record::Model, auth_user: &AuthUser) -> Result<(), AppError> {
    match OwnerRef::from_columns(record.owner_kind, record.owner_id) {
        OwnerRef::User(id) if id != auth_user.user_id => Err(AppError::PermissionDenied),
        _ => Ok(()),
    }
}

async fn find_file(state: &AppState, id: i32) -> Result<file_record::Model, AppError> {
    FileRecordService::new(&state.db)
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "File metadata and URL",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File", body = FileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "File belongs to another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FileResponse>, AppError> {
    let record = find_file(&state, id).await?;
    require_read_access(&record, &auth_user)?;
    Ok(Json(FileResponse::new(
        record,
        &state.disks,
        &state.config.upload.app_url,
    )?))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete one of the current user's files",
    description = "Removes the file record, any document describing it and the stored bytes.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "File is not owned by the current user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let record = find_file(&state, id).await?;
    if OwnerRef::from_columns(record.owner_kind, record.owner_id) != auth_user.owner() {
        return Err(AppError::PermissionDenied);
    }

    let txn = state.db.begin().await?;
    let purge = FileRecordService::new(&txn).delete(&record).await?;
    txn.commit().await?;
    purge.run(&state.disks).await;

    tracing::info!(file_id = id, "file deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/owners/{kind}/{id}/files",
    tag = "Files",
    operation_id = "listOwnerFiles",
    summary = "List the files of an owner",
    description = "`kind` is `user`, `article` or `event` (plural forms are accepted). Users may \
        only list their own files. Articles and events are owned by other services and are not \
        resolvable here yet, so those kinds currently answer 404.",
    params(
        ("kind" = String, Path, description = "Owner kind"),
        ("id" = i32, Path, description = "Owner ID"),
    ),
    responses(
        (status = 200, description = "Files, oldest first", body = FileListResponse),
        (status = 400, description = "Unknown owner kind (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Another user's files (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Owner not found, or an article/event owner (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_owner_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i32)>,
) -> Result<Json<FileListResponse>, AppError> {
    let owner = OwnerRef::parse(&kind, id)?;
    if matches!(owner, OwnerRef::User(_)) && owner != auth_user.owner() {
        return Err(AppError::PermissionDenied);
    }
    if !DbOwnerResolver::new(state.db.clone()).exists(&owner).await? {
        return Err(AppError::NotFound("Owner not found".into()));
    }

    let files = FileRecordService::new(&state.db)
        .list_for_owner(owner)
        .await?
        .into_iter()
        .map(|f| FileResponse::new(f, &state.disks, &state.config.upload.app_url))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(FileListResponse {
        total: files.len() as u64,
        files,
    }))
}
