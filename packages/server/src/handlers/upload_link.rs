use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::document::DocumentResponse;
use crate::models::upload_link::{
    GenerateLinkRequest, LatestLinkResponse, UploadFormResponse, UploadLinkResponse,
};
use crate::services::owner;
use crate::services::upload::UploadRules;
use crate::services::upload_link::{self, UploadLinkService, link_url, usable_link};
use crate::state::AppState;
use crate::utils::multipart::{UploadedFile, read_file_field, read_text_field};

#[utoipa::path(
    post,
    path = "/upload-links",
    tag = "Upload Links",
    operation_id = "generateUploadLink",
    summary = "Issue a single-use upload link",
    description = "Creates a link through which anyone holding it can deposit one certificate \
        for the current user. `duration` is the validity in days; `name`, when set, fixes the \
        document title.",
    request_body = GenerateLinkRequest,
    responses(
        (status = 201, description = "Link issued", body = UploadLinkResponse),
        (status = 400, description = "Invalid duration or title (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn generate_link(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<GenerateLinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    owner::provision_user(&state.db, auth_user.user_id, &auth_user.name).await?;

    let link = UploadLinkService::new(&state.db)
        .issue(
            auth_user.user_id,
            payload.name,
            payload.duration,
            &state.config.upload,
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadLinkResponse::new(link, &state.config.upload.app_url)),
    ))
}

#[utoipa::path(
    get,
    path = "/upload-links/latest",
    tag = "Upload Links",
    operation_id = "latestUploadLink",
    summary = "URL of the most recently issued link",
    responses(
        (status = 200, description = "Latest link", body = LatestLinkResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No link issued yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn latest_link(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LatestLinkResponse>, AppError> {
    let link = UploadLinkService::new(&state.db)
        .latest_for_user(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No upload link found".into()))?;

    Ok(Json(LatestLinkResponse {
        url: link_url(&state.config.upload.app_url, &link.token),
    }))
}

#[utoipa::path(
    get,
    path = "/public/upload-links/{token}",
    tag = "Upload Links",
    operation_id = "showUploadForm",
    summary = "Describe the upload form behind a link",
    params(("token" = String, Path, description = "Upload link token")),
    responses(
        (status = 200, description = "Link is usable", body = UploadFormResponse),
        (status = 404, description = "Unknown token (NOT_FOUND)", body = ErrorBody),
        (status = 410, description = "Link expired or already used (GONE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, token))]
pub async fn show_upload_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<UploadFormResponse>, AppError> {
    let link = usable_link(&state.db, &token, Utc::now()).await?;
    Ok(Json(UploadFormResponse::from(link)))
}

#[utoipa::path(
    post,
    path = "/public/upload-links/{token}",
    tag = "Upload Links",
    operation_id = "uploadThroughLink",
    summary = "Deposit a certificate through a link",
    description = "Multipart fields: `file` (required) and `title` (required unless the link \
        fixes one). Succeeds at most once per link.",
    params(("token" = String, Path, description = "Upload link token")),
    request_body(content_type = "multipart/form-data", description = "Certificate upload"),
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Invalid file, missing title or duplicate content (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown token (NOT_FOUND)", body = ErrorBody),
        (status = 410, description = "Link expired or already used (GONE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, token, multipart))]
pub async fn upload_through_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = UploadRules::certificate(&state.config.upload).max_size();
    let mut file: Option<UploadedFile> = None;
    let mut title: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => file = Some(read_file_field(field, max_size).await?),
            Some("title") => title = Some(read_text_field(field, "title").await?),
            _ => {}
        }
    }
    let file = file.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let (doc, record) = upload_link::consume(
        &state.db,
        &state.disks,
        &state.config.upload,
        &token,
        file,
        title,
        Utc::now(),
    )
    .await?;

    let response =
        DocumentResponse::new(doc, Some(record), &state.disks, &state.config.upload.app_url)?;
    Ok((StatusCode::CREATED, Json(response)))
}
