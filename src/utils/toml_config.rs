//! TOML-based configuration for Parlor
//!
//! Client settings (API endpoint, upload credentials, credential file,
//! logging, limits) are read from `parlor.toml`. Every field has a default,
//! so an empty file or no file at all yields a usable configuration.
//!
//! Use [`ConfigManager`] for shared access; the admin configuration screen
//! updates limits through it.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "parlor.toml";

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "PARLOR_API_URL";

/// Root configuration structure loaded from parlor.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

// ============= API Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ============= Upload Configuration =============

/// Image hosting credentials, referenced by environment variable name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_cloud_name_env")]
    pub cloud_name_env: String,

    #[serde(default = "default_upload_preset_env")]
    pub upload_preset_env: String,
}

fn default_cloud_name_env() -> String {
    "CLOUDINARY_CLOUD_NAME".to_string()
}

fn default_upload_preset_env() -> String {
    "CLOUDINARY_UPLOAD_PRESET".to_string()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            cloud_name_env: default_cloud_name_env(),
            upload_preset_env: default_upload_preset_env(),
        }
    }
}

// ============= Session Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where the bearer token is kept between runs
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

fn default_credentials_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parlor")
        .join("credentials.json")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============= Limits =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    #[serde(default = "default_max_group_members")]
    pub max_group_members: usize,
}

fn default_max_upload_mb() -> u64 {
    10
}

fn default_max_group_members() -> usize {
    crate::forms::models::DEFAULT_MAX_GROUP_MEMBERS
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: default_max_upload_mb(),
            max_group_members: default_max_group_members(),
        }
    }
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be greater than 0".to_string(),
            ));
        }
        if self.max_group_members < 2 {
            return Err(ConfigError::ValidationError(
                "limits.max_group_members must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Config(err.to_string())
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `path` when it exists, otherwise start from defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: ClientConfig = toml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.limits.validate()
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    pub fn cloud_name(&self) -> Option<String> {
        self.resolve_env(&self.upload.cloud_name_env)
    }

    pub fn upload_preset(&self) -> Option<String> {
        self.resolve_env(&self.upload.upload_preset_env)
    }
}

/// Shared, swappable configuration
pub struct ConfigManager {
    config: ArcSwap<ClientConfig>,
    path: Option<PathBuf>,
}

impl ConfigManager {
    /// Wrap an in-memory configuration that has no backing file
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            path: None,
        }
    }

    /// Load from `path`, falling back to defaults when the file is absent
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let config = ClientConfig::load_or_default(&path)?;
        Ok(Self {
            config: ArcSwap::from_pointee(config),
            path: Some(path),
        })
    }

    pub fn config(&self) -> Arc<ClientConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-read the backing file
    pub fn reload(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            let config = ClientConfig::load_or_default(path)?;
            self.config.store(Arc::new(config));
            info!("Configuration reloaded from {}", path.display());
        }
        Ok(())
    }

    /// Validate and apply new limits, persisting them when file-backed.
    ///
    /// Only the `[limits]` table of the file is rewritten. Environment
    /// overrides and defaults never leak into it.
    pub fn update_limits(&self, limits: LimitsConfig) -> Result<(), ConfigError> {
        limits.validate()?;

        if let Some(path) = &self.path {
            write_limits(path, limits)?;
        }

        let mut next = self.config().as_ref().clone();
        next.limits = limits;
        self.config.store(Arc::new(next));
        info!(
            max_upload_mb = limits.max_upload_mb,
            max_group_members = limits.max_group_members,
            "Limits updated"
        );
        Ok(())
    }
}

/// Replace the `[limits]` table of the file at `path`, leaving the rest as written
fn write_limits(path: &Path, limits: LimitsConfig) -> Result<(), ConfigError> {
    let mut table = if path.exists() {
        fs::read_to_string(path)?.parse::<toml::Table>()?
    } else {
        toml::Table::new()
    };
    table.insert("limits".to_string(), toml::Value::try_from(limits)?);
    fs::write(path, toml::to_string_pretty(&table)?)?;
    Ok(())
}
