// ABOUTME: Configuration loading for the storage engine.
// ABOUTME: Reads the store location, bootstrap owner credentials and retry tuning from environment variables.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use playvault_core::SiteConfig;
use thiserror::Error;

use crate::retry::RetryPolicy;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_DB_FILE: &str = "playvault.db";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be a non-negative integer, got {1:?}")]
    InvalidNumber(&'static str, String),

    #[error(
        "PLAYVAULT_OWNER_USERNAME and PLAYVAULT_OWNER_PASSWORD must be set together; only {0} is set"
    )]
    PartialOwner(&'static str),

    #[error("PLAYVAULT_RETRY_ATTEMPTS must be at least 1")]
    ZeroAttempts,
}

/// Credentials for the owner account seeded on first boot.
#[derive(Clone, PartialEq, Eq)]
pub struct OwnerCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for OwnerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Storage engine configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
    /// Seeded as the `owner` account only when the store file is created.
    pub owner: Option<OwnerCredentials>,
    /// How long SQLite itself waits on a lock before reporting busy.
    pub busy_timeout: Duration,
    pub retry: RetryPolicy,
    /// Starting point for `read_admin_config` before stored settings are overlaid.
    pub site_defaults: SiteConfig,
}

impl StoreConfig {
    /// A config rooted at `data_dir` with every other setting at its default.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_name: DEFAULT_DB_FILE.to_string(),
            owner: None,
            busy_timeout: Duration::from_millis(5000),
            retry: RetryPolicy::default(),
            site_defaults: SiteConfig::default(),
        }
    }

    pub fn with_owner(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.owner = Some(OwnerCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Full path of the store file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - PLAYVAULT_DATA_DIR: directory holding the store (default: ./data)
    /// - PLAYVAULT_DB_FILE: store file name (default: playvault.db)
    /// - PLAYVAULT_OWNER_USERNAME / PLAYVAULT_OWNER_PASSWORD: bootstrap owner (optional, both or neither)
    /// - PLAYVAULT_BUSY_TIMEOUT_MS: engine busy wait (default: 5000)
    /// - PLAYVAULT_RETRY_ATTEMPTS: retry wrapper attempts (default: 3)
    ///
    /// Site defaults are read by `SiteConfig::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.site_defaults = SiteConfig::from_env();
        Ok(config)
    }

    /// Same as `from_env` for the store settings, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let mut config = Self::new(
            get("PLAYVAULT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        );

        if let Some(file_name) = get("PLAYVAULT_DB_FILE") {
            config.file_name = file_name;
        }

        config.owner = match (get("PLAYVAULT_OWNER_USERNAME"), get("PLAYVAULT_OWNER_PASSWORD")) {
            (Some(username), Some(password)) => Some(OwnerCredentials { username, password }),
            (Some(_), None) => return Err(ConfigError::PartialOwner("PLAYVAULT_OWNER_USERNAME")),
            (None, Some(_)) => return Err(ConfigError::PartialOwner("PLAYVAULT_OWNER_PASSWORD")),
            (None, None) => None,
        };

        if let Some(raw) = get("PLAYVAULT_BUSY_TIMEOUT_MS") {
            let ms: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PLAYVAULT_BUSY_TIMEOUT_MS", raw.clone()))?;
            config.busy_timeout = Duration::from_millis(ms);
        }

        if let Some(raw) = get("PLAYVAULT_RETRY_ATTEMPTS") {
            let attempts: u32 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PLAYVAULT_RETRY_ATTEMPTS", raw.clone()))?;
            if attempts == 0 {
                return Err(ConfigError::ZeroAttempts);
            }
            config.retry.max_attempts = attempts;
        }

        Ok(config)
    }
}
