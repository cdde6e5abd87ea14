use async_trait::async_trait;

use super::error::StorageError;

/// Who may read an object directly from its backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub visibility: Visibility,
    pub content_type: Option<String>,
}

impl PutOptions {
    pub fn private(content_type: Option<String>) -> Self {
        Self {
            visibility: Visibility::Private,
            content_type,
        }
    }

    pub fn public(content_type: Option<String>) -> Self {
        Self {
            visibility: Visibility::Public,
            content_type,
        }
    }
}

/// A named byte store addressed by disk-relative keys such as
/// `certificate/9/abcXYZ_20260101.pdf`.
#[async_trait]
pub trait Disk: Send + Sync {
    /// Name this disk is registered under (stored in `file_record.disk`).
    fn name(&self) -> &str;

    /// Store bytes under `path`, replacing anything already there.
    async fn put(&self, path: &str, data: &[u8], options: PutOptions) -> Result<(), StorageError>;

    /// Retrieve all bytes stored under `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete the object at `path`.
    ///
    /// Returns `true` if something was deleted, `false` if nothing was there.
    /// A missing key is never an error.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// List every key below `prefix`, in no particular order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// URL under which the backend itself exposes `path`.
    fn public_url(&self, path: &str) -> String;
}

/// Reject keys that are empty, absolute, or contain empty or `..` segments.
pub fn validate_key(path: &str) -> Result<(), StorageError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");

    if invalid {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Like [`validate_key`], but a trailing `/` (directory-style prefix) is allowed.
pub fn validate_prefix(prefix: &str) -> Result<(), StorageError> {
    validate_key(prefix.trim_end_matches('/'))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
