use chrono::{DateTime, Utc};
use common::DiskRegistry;
use serde::Serialize;

use crate::entity::{OwnerKind, file_record};
use crate::error::AppError;
use crate::services::file_record::resolve_url;

/// Response DTO for a single stored file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    #[schema(example = 17)]
    pub id: i32,
    /// Kind of entity owning the file; absent for orphan files.
    pub owner_kind: Option<OwnerKind>,
    #[schema(example = 9)]
    pub owner_id: Option<i32>,
    /// Logical filename without extension.
    #[schema(example = "diploma")]
    pub name: String,
    #[schema(example = "pdf")]
    pub extension: String,
    #[schema(example = "application/pdf")]
    pub mimetype: Option<String>,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: Option<i64>,
    /// SHA-256 content hash.
    #[schema(example = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    pub hash: String,
    #[schema(example = "s3")]
    pub disk: String,
    /// Where the file can be fetched. Certificates point at the public gateway.
    #[schema(example = "https://members.example.org/certificate/9/abcXYZ_20260101.pdf")]
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl FileResponse {
    pub fn new(
        model: file_record::Model,
        disks: &DiskRegistry,
        app_url: &str,
    ) -> Result<Self, AppError> {
        let url = resolve_url(&model, disks, app_url)?;
        Ok(Self {
            id: model.id,
            owner_kind: model.owner_kind,
            owner_id: model.owner_id,
            name: model.name,
            extension: model.extension,
            mimetype: model.mimetype,
            size: model.size,
            hash: model.hash,
            disk: model.disk,
            url,
            created_at: model.created_at,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
}
