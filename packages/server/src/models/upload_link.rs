use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::upload_link;
use crate::services::upload_link::link_url;

/// Request body for issuing an upload link.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct GenerateLinkRequest {
    /// Validity in days.
    #[schema(example = 3, minimum = 1)]
    pub duration: i64,
    /// Fixed document title. When omitted the uploader must provide one.
    #[schema(example = "Medical certificate")]
    pub name: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadLinkResponse {
    pub id: i32,
    /// Secret token embedded in `url`.
    pub token: String,
    #[schema(example = "https://members.example.org/api/v1/public/upload-links/Zx81...")]
    pub url: String,
    pub title: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UploadLinkResponse {
    pub fn new(model: upload_link::Model, app_url: &str) -> Self {
        Self {
            id: model.id,
            url: link_url(app_url, &model.token),
            token: model.token,
            title: model.title,
            expires_at: model.expires_at,
            used_at: model.used_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LatestLinkResponse {
    pub url: String,
}

/// What the public upload form needs to render.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadFormResponse {
    /// Whether the uploader has to supply a `title` field.
    pub title_required: bool,
    pub title: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<upload_link::Model> for UploadFormResponse {
    fn from(model: upload_link::Model) -> Self {
        Self {
            title_required: model.requires_title(),
            title: model.title,
            expires_at: model.expires_at,
        }
    }
}
