use std::collections::HashMap;
use std::sync::Arc;

use super::error::StorageError;
use super::local::LocalDisk;
use super::memory::MemoryDisk;
use super::traits::Disk;
use crate::config::{DiskConfig, StorageAppConfig};

/// Disk name -> backend map, resolved once at startup.
#[derive(Clone)]
pub struct DiskRegistry {
    disks: HashMap<String, Arc<dyn Disk>>,
    default_disk: String,
    remote_disk: String,
}

impl DiskRegistry {
    pub fn new(default_disk: impl Into<String>, remote_disk: impl Into<String>) -> Self {
        Self {
            disks: HashMap::new(),
            default_disk: default_disk.into(),
            remote_disk: remote_disk.into(),
        }
    }

    /// Register a disk under its own name, replacing any previous one.
    pub fn with_disk(mut self, disk: Arc<dyn Disk>) -> Self {
        self.disks.insert(disk.name().to_string(), disk);
        self
    }

    /// Build every configured disk.
    ///
    /// Fails if the default or remote disk name is not configured.
    pub async fn from_config(config: &StorageAppConfig) -> Result<Self, StorageError> {
        let mut registry = Self::new(&config.default_disk, &config.remote_disk);

        for (name, disk_config) in &config.disks {
            let disk: Arc<dyn Disk> = match disk_config {
                DiskConfig::Local(local) => {
                    Arc::new(LocalDisk::new(name, local.root.clone(), &local.url).await?)
                }
                DiskConfig::Memory(memory) => Arc::new(MemoryDisk::new(name, &memory.url)),
                #[cfg(feature = "object-storage")]
                DiskConfig::S3(s3) => Arc::new(super::s3::S3Disk::new(name, s3)?),
                #[cfg(not(feature = "object-storage"))]
                DiskConfig::S3(_) => {
                    return Err(StorageError::Backend(format!(
                        "disk '{name}' needs the object-storage feature"
                    )));
                }
            };
            tracing::info!(disk = %name, "registered storage disk");
            registry = registry.with_disk(disk);
        }

        registry.disk(&config.default_disk)?;
        registry.disk(&config.remote_disk)?;
        Ok(registry)
    }

    pub fn disk(&self, name: &str) -> Result<&Arc<dyn Disk>, StorageError> {
        self.disks
            .get(name)
            .ok_or_else(|| StorageError::UnknownDisk(name.to_string()))
    }

    pub fn default_disk(&self) -> Result<&Arc<dyn Disk>, StorageError> {
        self.disk(&self.default_disk)
    }

    pub fn remote_disk(&self) -> Result<&Arc<dyn Disk>, StorageError> {
        self.disk(&self.remote_disk)
    }

    pub fn default_name(&self) -> &str {
        &self.default_disk
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_disk
    }
}
