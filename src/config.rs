//! Configuration module for tapi.
//!
//! Loads configuration from YAML files and environment variables.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Connections kept available in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Extra connections allowed beyond `pool_size` under load.
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,
    /// Seconds to wait for a free connection before giving up.
    #[serde(default = "default_pool_timeout_secs")]
    pub pool_timeout_secs: u64,
}

/// API key authentication configuration.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// The shared secret expected in the `X-API-Key` header.
    pub api_key: String,
}

// Keep the secret out of debug output and logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    "sqlite://tapi.db".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_max_overflow() -> u32 {
    2
}

fn default_pool_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            pool_size: default_pool_size(),
            max_overflow: default_max_overflow(),
            pool_timeout_secs: default_pool_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Upper bound on open connections (base size plus overflow).
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow).max(1)
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TAPI_*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml (if exists)
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("TAPI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.api_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.api_key must be set (e.g. via TAPI_AUTH__API_KEY)".to_string(),
            ));
        }
        if self.database.pool_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "database.pool_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
