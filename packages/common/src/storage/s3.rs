use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::{Disk, PutOptions, Visibility, join_url, validate_key, validate_prefix};
use crate::config::S3DiskConfig;

/// Remote object-store disk.
pub struct S3Disk {
    name: String,
    url: String,
    bucket: Box<Bucket>,
}

impl std::fmt::Debug for S3Disk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Disk")
            .field("name", &self.name)
            .field("bucket", &self.bucket.name())
            .finish()
    }
}

impl From<S3Error> for StorageError {
    fn from(err: S3Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl S3Disk {
    #[tracing::instrument(skip(name, config), name = "S3Disk::new", fields(bucket = %config.bucket), err)]
    pub fn new(name: impl Into<String>, config: &S3DiskConfig) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            name: name.into(),
            url: config.url.clone(),
            bucket,
        })
    }
}

fn check_status(path: &str, status: u16) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(path.to_string())),
        other => Err(StorageError::Backend(format!(
            "unexpected status {other} for {path}"
        ))),
    }
}

#[async_trait]
impl Disk for S3Disk {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, data, options), fields(disk = %self.name, size = data.len()), err)]
    async fn put(&self, path: &str, data: &[u8], options: PutOptions) -> Result<(), StorageError> {
        validate_key(path)?;
        let content_type = options
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        let response = if options.visibility == Visibility::Public {
            let mut bucket = self.bucket.clone();
            bucket.add_header("x-amz-acl", "public-read");
            bucket
                .put_object_with_content_type(path, data, content_type)
                .await?
        } else {
            self.bucket
                .put_object_with_content_type(path, data, content_type)
                .await?
        };

        check_status(path, response.status_code())
    }

    #[tracing::instrument(skip(self), fields(disk = %self.name), err)]
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(path)?;
        match self.bucket.get_object(path).await {
            Ok(response) => {
                check_status(path, response.status_code())?;
                Ok(response.bytes().to_vec())
            }
            Err(S3Error::HttpFailWithBody(404, _)) => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        validate_key(path)?;
        match self.bucket.head_object(path).await {
            Ok((_, status)) if (200..=299).contains(&status) => Ok(true),
            Ok((_, 404)) | Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Ok((_, status)) => Err(StorageError::Backend(format!(
                "unexpected status {status} for {path}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(disk = %self.name), err)]
    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        validate_key(path)?;
        if !self.exists(path).await? {
            return Ok(false);
        }
        match self.bucket.delete_object(path).await {
            Ok(response) => match response.status_code() {
                200..=299 => Ok(true),
                404 => Ok(false),
                other => Err(StorageError::Backend(format!(
                    "unexpected status {other} deleting {path}"
                ))),
            },
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(disk = %self.name), err)]
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        validate_prefix(prefix)?;
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        let pages = self.bucket.list(prefix, None).await?;
        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents.into_iter().map(|object| object.key))
            .collect())
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.url, path)
    }
}
