use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::document::DocumentResponse;
use crate::services::certificate::{CertificateDocument, store_certificate as store};
use crate::services::{gateway, owner};
use crate::services::upload::{UploadRules, validate_title};
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;
use crate::utils::multipart::{UploadedFile, read_file_field, read_text_field};

#[utoipa::path(
    post,
    path = "/certificates",
    tag = "Certificates",
    operation_id = "storeCertificate",
    summary = "Upload a certificate",
    description = "Stores a certificate for the current user and creates its document. \
        Multipart fields: `file` (required), `title` (required), `expires_at` (optional, \
        YYYY-MM-DD, must be in the future; defaults to the configured validity window) and \
        `metadata` (optional JSON object).",
    request_body(content_type = "multipart/form-data", description = "Certificate file and document details"),
    responses(
        (status = 201, description = "Certificate stored", body = DocumentResponse),
        (status = 400, description = "Invalid file, title, date or duplicate content (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn store_certificate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    owner::provision_user(&state.db, auth_user.user_id, &auth_user.name).await?;

    let max_size = UploadRules::certificate(&state.config.upload).max_size();
    let mut file: Option<UploadedFile> = None;
    let mut title: Option<String> = None;
    let mut expires_at: Option<NaiveDate> = None;
    let mut metadata: Option<serde_json::Value> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => file = Some(read_file_field(field, max_size).await?),
            Some("title") => title = Some(read_text_field(field, "title").await?),
            Some("expires_at") => {
                let text = read_text_field(field, "expires_at").await?;
                if !text.trim().is_empty() {
                    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
                        AppError::Validation("expires_at must be a YYYY-MM-DD date".into())
                    })?;
                    expires_at = Some(date);
                }
            }
            Some("metadata") => {
                let text = read_text_field(field, "metadata").await?;
                let value: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| AppError::Validation(format!("Invalid metadata: {e}")))?;
                if !value.is_object() {
                    return Err(AppError::Validation("metadata must be a JSON object".into()));
                }
                metadata = Some(value);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let title = validate_title(title.as_deref().unwrap_or_default())?;

    let (doc, record) = store(
        &state.db,
        &state.disks,
        &state.config.upload,
        auth_user.user_id,
        file,
        CertificateDocument {
            title,
            expiration_date: expires_at,
            metadata,
        },
        Utc::now().date_naive(),
    )
    .await?;

    let response =
        DocumentResponse::new(doc, Some(record), &state.disks, &state.config.upload.app_url)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/certificate/{owner_id}/{filename}",
    tag = "Certificates",
    operation_id = "showCertificate",
    summary = "Read a certificate through its public link",
    description = "Serves the certificate inline while today is strictly before the expiry \
        encoded in its filename. No authentication; the random token in the filename is the \
        credential.",
    params(
        ("owner_id" = i32, Path, description = "Owning user ID"),
        ("filename" = String, Path, description = "Stored filename, `{token}_{YYYYMMDD}.{ext}`"),
    ),
    responses(
        (status = 200, description = "Certificate content"),
        (status = 404, description = "No such certificate (NOT_FOUND)", body = ErrorBody),
        (status = 410, description = "Certificate expired (GONE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn show_certificate(
    State(state): State<AppState>,
    Path((owner_id, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let owner_id: i32 = owner_id
        .parse()
        .map_err(|_| AppError::NotFound("Certificate not found".into()))?;

    let content =
        gateway::show_public(&state.disks, owner_id, &filename, Utc::now().date_naive()).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &content.content_type)
        .header(header::CONTENT_LENGTH, content.data.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&content.filename),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(content.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
