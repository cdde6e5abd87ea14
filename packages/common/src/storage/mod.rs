mod error;
mod hash;
mod traits;

pub mod local;
pub mod memory;
pub mod registry;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use hash::ContentHash;
pub use registry::DiskRegistry;
pub use traits::{Disk, PutOptions, Visibility, validate_key, validate_prefix};
