use chrono::{DateTime, NaiveDate, Utc};
use common::DiskRegistry;
use serde::Serialize;

use super::file::FileResponse;
use crate::entity::{document, file_record};
use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Medical certificate")]
    pub title: String,
    /// Date the underlying certificate stops being served.
    pub expiration_date: Option<NaiveDate>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub user_id: i32,
    /// `None` only if the file record went missing.
    pub file: Option<FileResponse>,
    pub created_at: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn new(
        doc: document::Model,
        file: Option<file_record::Model>,
        disks: &DiskRegistry,
        app_url: &str,
    ) -> Result<Self, AppError> {
        let file = file
            .map(|f| FileResponse::new(f, disks, app_url))
            .transpose()?;
        Ok(Self {
            id: doc.id,
            title: doc.title,
            expiration_date: doc.expiration_date,
            metadata: doc.metadata,
            user_id: doc.user_id,
            file,
            created_at: doc.created_at,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub total: u64,
}
