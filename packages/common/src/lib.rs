pub mod certificate;
pub mod config;
pub mod storage;
pub mod token;

pub use certificate::{CertificateName, CertificateNameError};
pub use storage::{ContentHash, Disk, DiskRegistry, PutOptions, StorageError, Visibility};
