use common::config::StorageAppConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Max tracing level: "trace", "debug", "info", "warn" or "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Limits and naming for uploaded files and upload links.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Public base URL used when building links handed to users. Default: "".
    #[serde(default)]
    pub app_url: String,
    /// Default: 10 MiB.
    #[serde(default = "default_certificate_max_size")]
    pub certificate_max_size: u64,
    /// Default: 2 MiB.
    #[serde(default = "default_image_max_size")]
    pub image_max_size: u64,
    /// Lifetime of certificates deposited through upload links. Default: 30.
    #[serde(default = "default_certificate_validity_days")]
    pub certificate_validity_days: i64,
    /// Default: 64.
    #[serde(default = "default_link_token_length")]
    pub link_token_length: usize,
    /// Upper bound for the validity requested when issuing a link. Default: 365.
    #[serde(default = "default_max_link_duration_days")]
    pub max_link_duration_days: i64,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_certificate_max_size() -> u64 {
    10 * 1024 * 1024
}
fn default_image_max_size() -> u64 {
    2 * 1024 * 1024
}
fn default_certificate_validity_days() -> i64 {
    30
}
fn default_link_token_length() -> usize {
    common::token::UPLOAD_LINK_TOKEN_LEN
}
fn default_max_link_duration_days() -> i64 {
    365
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            app_url: String::new(),
            certificate_max_size: default_certificate_max_size(),
            image_max_size: default_image_max_size(),
            certificate_validity_days: default_certificate_validity_days(),
            link_token_length: default_link_token_length(),
            max_link_duration_days: default_max_link_duration_days(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageAppConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl UploadConfig {
    /// Reject settings that would weaken upload links.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link_token_length < common::token::MIN_LINK_TOKEN_LEN {
            return Err(ConfigError::Message(format!(
                "upload.link_token_length must be at least {}, got {}",
                common::token::MIN_LINK_TOKEN_LEN,
                self.link_token_length
            )));
        }
        if self.max_link_duration_days < 1 {
            return Err(ConfigError::Message(
                "upload.max_link_duration_days must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CLOVER_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://clover.db?mode=rwc")?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., CLOVER__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("CLOVER").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.upload.validate()?;
        Ok(config)
    }
}
