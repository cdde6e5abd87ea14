use axum::extract::multipart::Field;

use crate::error::AppError;
use crate::utils::filename::{UploadName, split_upload_name};

/// A file part fully buffered from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, split and validated.
    pub name: UploadName,
    /// MIME type sent by the client, if any.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Client type if given, otherwise guessed from the extension.
    pub fn mimetype(&self) -> Option<String> {
        self.content_type
            .clone()
            .filter(|t| !t.is_empty() && t != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_ext(&self.name.extension)
                    .first()
                    .map(|m| m.to_string())
            })
    }
}

/// Buffer a multipart file field, rejecting it as soon as it exceeds `max_size`.
pub async fn read_file_field(
    mut field: Field<'_>,
    max_size: u64,
) -> Result<UploadedFile, AppError> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let name = split_upload_name(&filename).map_err(|e| AppError::Validation(e.message().into()))?;
    let content_type = field.content_type().map(str::to_string);

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        name,
        content_type,
        data,
    })
}

/// Read a text field, mapping transport errors to validation errors.
pub async fn read_text_field(field: Field<'_>, what: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {what}: {e}")))
}
