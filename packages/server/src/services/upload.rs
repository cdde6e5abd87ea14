use crate::config::UploadConfig;
use crate::error::AppError;
use crate::utils::multipart::UploadedFile;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];

pub const CERTIFICATE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "pdf", "doc", "docx",
];

const MAX_TITLE_CHARS: usize = 256;

/// Type and size constraints applied to an upload before anything is stored.
#[derive(Debug, Clone, Copy)]
pub struct UploadRules {
    extensions: &'static [&'static str],
    max_size: u64,
}

impl UploadRules {
    pub fn certificate(config: &UploadConfig) -> Self {
        Self {
            extensions: CERTIFICATE_EXTENSIONS,
            max_size: config.certificate_max_size,
        }
    }

    pub fn image(config: &UploadConfig) -> Self {
        Self {
            extensions: IMAGE_EXTENSIONS,
            max_size: config.image_max_size,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn validate(&self, file: &UploadedFile) -> Result<(), AppError> {
        if !self.extensions.contains(&file.name.extension.as_str()) {
            return Err(AppError::Validation(format!(
                "File type '.{}' is not allowed; expected one of: {}",
                file.name.extension,
                self.extensions.join(", ")
            )));
        }
        if file.data.is_empty() {
            return Err(AppError::Validation("File is empty".into()));
        }
        if file.size() > self.max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                self.max_size
            )));
        }
        Ok(())
    }
}

/// Trim a title and check it is 1-256 characters long.
pub fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "Title must be 1-{MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}
