use std::fmt;

/// Errors that can occur during disk operations.
#[derive(Debug)]
pub enum StorageError {
    /// Nothing is stored under the requested key.
    NotFound(String),
    /// An I/O error occurred on a local disk.
    Io(std::io::Error),
    /// The key is empty, absolute or escapes the disk root.
    InvalidPath(String),
    /// No disk is registered under this name.
    UnknownDisk(String),
    /// The remote backend rejected or failed the request.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "object not found: {path}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidPath(path) => write!(f, "invalid storage path: {path:?}"),
            Self::UnknownDisk(name) => write!(f, "unknown disk: {name}"),
            Self::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
