use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::StorageError;
use super::traits::{Disk, PutOptions, join_url, validate_key, validate_prefix};

/// In-process disk. Contents are lost when the process exits.
#[derive(Debug)]
pub struct MemoryDisk {
    name: String,
    url: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDisk {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Disk for MemoryDisk {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, path: &str, data: &[u8], _options: PutOptions) -> Result<(), StorageError> {
        validate_key(path)?;
        self.objects
            .write()
            .await
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(path)?;
        self.objects
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        validate_key(path)?;
        Ok(self.objects.read().await.contains_key(path))
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        validate_key(path)?;
        Ok(self.objects.write().await.remove(path).is_some())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        validate_prefix(prefix)?;
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(&dir))
            .cloned()
            .collect())
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.url, path)
    }
}
