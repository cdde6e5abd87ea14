use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Storage configuration: which disks exist and which ones play the
/// "public" and "remote object store" roles.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Disk used for local public assets. Default: "public".
    #[serde(default = "default_public_disk")]
    pub default_disk: String,
    /// Disk acting as the remote object store (certificates, avatars). Default: "s3".
    #[serde(default = "default_remote_disk")]
    pub remote_disk: String,
    #[serde(default = "default_disks")]
    pub disks: HashMap<String, DiskConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum DiskConfig {
    Local(LocalDiskConfig),
    S3(S3DiskConfig),
    Memory(MemoryDiskConfig),
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalDiskConfig {
    pub root: PathBuf,
    /// URL prefix under which `root` is served. Default: "/storage".
    #[serde(default = "default_local_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3DiskConfig {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    #[serde(default)]
    pub path_style: bool,
    /// Public base URL of the bucket.
    pub url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MemoryDiskConfig {
    #[serde(default)]
    pub url: String,
}

fn default_public_disk() -> String {
    "public".into()
}
fn default_remote_disk() -> String {
    "s3".into()
}
fn default_local_url() -> String {
    "/storage".into()
}
fn default_region() -> String {
    "us-east-1".into()
}

/// Local public disk under `./storage/public` and an in-memory stand-in for
/// the remote store, enough to run the service without external services.
fn default_disks() -> HashMap<String, DiskConfig> {
    HashMap::from([
        (
            default_public_disk(),
            DiskConfig::Local(LocalDiskConfig {
                root: PathBuf::from("storage/public"),
                url: default_local_url(),
            }),
        ),
        (
            default_remote_disk(),
            DiskConfig::Memory(MemoryDiskConfig::default()),
        ),
    ])
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            default_disk: default_public_disk(),
            remote_disk: default_remote_disk(),
            disks: default_disks(),
        }
    }
}
