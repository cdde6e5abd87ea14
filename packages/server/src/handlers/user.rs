use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::file::FileResponse;
use crate::services::{avatar, owner};
use crate::services::upload::UploadRules;
use crate::state::AppState;
use crate::utils::multipart::{UploadedFile, read_file_field};

#[utoipa::path(
    post,
    path = "/users/me/avatar",
    tag = "Users",
    operation_id = "uploadAvatar",
    summary = "Replace the current user's profile picture",
    description = "Uploads an image (`file` multipart field) to \
        `user_profile_pictures/{user_id}.{ext}` on the remote disk. The previous picture is \
        removed. Uploading content identical to one of the user's files is rejected.",
    request_body(content_type = "multipart/form-data", description = "Image upload"),
    responses(
        (status = 201, description = "Avatar stored", body = FileResponse),
        (status = 400, description = "Invalid image or duplicate content (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    owner::provision_user(&state.db, auth_user.user_id, &auth_user.name).await?;

    let max_size = UploadRules::image(&state.config.upload).max_size();
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            file = Some(read_file_field(field, max_size).await?);
        }
    }
    let file = file.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let record = avatar::replace_avatar(
        &state.db,
        &state.disks,
        &state.config.upload,
        auth_user.user_id,
        file,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(FileResponse::new(
            record,
            &state.disks,
            &state.config.upload.app_url,
        )?),
    ))
}

#[utoipa::path(
    delete,
    path = "/users/me",
    tag = "Users",
    operation_id = "deleteCurrentUser",
    summary = "Delete the current account",
    description = "Deletes the account together with its upload links, documents and files, \
        including the stored bytes.",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_current_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    owner::delete_user(&state.db, &state.disks, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
