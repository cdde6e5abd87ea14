use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{Disk, PutOptions, join_url, validate_key, validate_prefix};

const TMP_DIR: &str = ".tmp";

/// Disk backed by a local directory, typically served by the web server
/// under a public prefix such as `/storage`.
///
/// Writes go to `{root}/.tmp` first and are renamed into place, so readers
/// never observe a partially written object.
#[derive(Debug)]
pub struct LocalDisk {
    name: String,
    root: PathBuf,
    url: String,
}

impl LocalDisk {
    pub async fn new(
        name: impl Into<String>,
        root: PathBuf,
        url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(TMP_DIR)).await?;
        Ok(Self {
            name: name.into(),
            root,
            url: url.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_key(path)?;
        if path == TMP_DIR || path.starts_with(&format!("{TMP_DIR}/")) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(path))
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(TMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl Disk for LocalDisk {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, data, options), fields(disk = %self.name, size = data.len()), err)]
    async fn put(&self, path: &str, data: &[u8], options: PutOptions) -> Result<(), StorageError> {
        let target = self.object_path(path)?;
        tracing::trace!(visibility = ?options.visibility, "writing local object");

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.object_path(path)?;
        match fs::read(&target).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let target = self.object_path(path)?;
        match fs::metadata(&target).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(disk = %self.name), err)]
    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let target = self.object_path(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        validate_prefix(prefix)?;
        let base = prefix.trim_end_matches('/');

        let mut keys = Vec::new();
        let mut pending = vec![(self.root.join(base), base.to_string())];

        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                    continue;
                };
                let key = format!("{key_prefix}/{file_name}");
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push((entry.path(), key));
                } else if file_type.is_file() {
                    keys.push(key);
                }
            }
        }

        Ok(keys)
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.url, path)
    }
}
