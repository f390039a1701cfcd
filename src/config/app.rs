//! Main application configuration
//!
//! This module defines the configuration used by the command-line front end,
//! including environment variable loading, TOML files, and validation.

use crate::config::ClientConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub sldb: ClientConfig,
}

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Name used in log output
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "sldb-client".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // SLDB settings
        if let Ok(host) = env::var("SLDB_HOST") {
            self.sldb.host = host;
        }
        if let Ok(port) = env::var("SLDB_PORT") {
            self.sldb.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid SLDB_PORT value: {}", port))?;
        }
        if let Ok(username) = env::var("SLDB_USERNAME") {
            self.sldb.username = username;
        }
        if let Ok(password) = env::var("SLDB_PASSWORD") {
            self.sldb.password = password;
        }
        if let Ok(verbose) = env::var("SLDB_VERBOSE") {
            self.sldb.verbose = verbose
                .parse()
                .map_err(|_| anyhow!("Invalid SLDB_VERBOSE value: {}", verbose))?;
        }
        if let Ok(path) = env::var("SLDB_RPC_PATH") {
            self.sldb.rpc_path = path;
        }
        if let Ok(timeout) = env::var("SLDB_TIMEOUT_SECONDS") {
            self.sldb.request_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SLDB_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.sldb.host.is_empty() {
        return Err(anyhow!("SLDB host cannot be empty"));
    }
    if config.sldb.port == 0 {
        return Err(anyhow!("SLDB port cannot be 0"));
    }
    if config.sldb.request_timeout_seconds == 0 {
        return Err(anyhow!("SLDB request timeout must be greater than 0"));
    }

    Ok(())
}

/// Check that credentials are present before issuing calls
pub fn require_credentials(config: &ClientConfig) -> Result<()> {
    if config.username.is_empty() {
        return Err(anyhow!("SLDB username is not configured"));
    }
    if config.password.is_empty() {
        return Err(anyhow!("SLDB password is not configured"));
    }
    Ok(())
}
