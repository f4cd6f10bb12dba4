//! Configuration loading for the KM24 agent
//!
//! Settings are resolved with the following priority:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (`KM24_API_KEY`, `KM24_BASE_URL`, `KM24_REQUEST_TIMEOUT_SECS`)
//! 3. TOML config file
//! 4. Built-in defaults
//!
//! A `.env` file in the working directory is folded into the environment
//! before resolution (see [`load_dotenv`]).

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Production KM24 REST API root
pub const DEFAULT_BASE_URL: &str = "https://km24.dk/api";

/// Upper bound applied to every upstream request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_KEY: &str = "KM24_API_KEY";
pub const ENV_BASE_URL: &str = "KM24_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "KM24_REQUEST_TIMEOUT_SECS";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// KM24 API key (sent as `X-API-Key`)
    #[serde(default)]
    pub km24_api_key: Option<String>,

    /// Override for the platform REST root
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Fully resolved settings for talking to the KM24 platform
#[derive(Clone)]
pub struct PlatformConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl PlatformConfig {
    /// Resolve platform settings from CLI overrides, environment and TOML
    ///
    /// Fails fast with [`Error::Config`] when no usable API key is found.
    pub fn resolve(toml_config: &TomlConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let api_key = resolve_api_key(toml_config, overrides)?;

        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| std::env::var(ENV_BASE_URL).ok())
            .or_else(|| toml_config.base_url.clone())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        let timeout_secs = match std::env::var(ENV_REQUEST_TIMEOUT_SECS) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("Invalid {}: '{}' ({})", ENV_REQUEST_TIMEOUT_SECS, raw, e))
            })?,
            Err(_) => toml_config
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(Error::Config(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }

        debug!(base_url = %base_url, timeout_secs, "Resolved platform configuration");

        Ok(Self {
            api_key,
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Resolve the KM24 API key
///
/// **Priority:** CLI → ENV → TOML
fn resolve_api_key(toml_config: &TomlConfig, overrides: &ConfigOverrides) -> Result<String> {
    let candidates = [
        ("command line", overrides.api_key.clone()),
        ("environment", std::env::var(ENV_API_KEY).ok()),
        ("TOML", toml_config.km24_api_key.clone()),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, key)| key.as_deref().is_some_and(is_valid_key))
        .map(|(source, _)| *source)
        .collect();

    if sources.len() > 1 {
        warn!(
            "KM24 API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, key) in candidates {
        if let Some(key) = key.filter(|k| is_valid_key(k)) {
            info!("KM24 API key loaded from {}", source);
            return Ok(key.trim().to_string());
        }
    }

    Err(Error::Config(format!(
        "KM24 API key not configured. Please configure using one of:\n\
         1. Command line: --api-key your-key\n\
         2. Environment: {}=your-key (or a .env file)\n\
         3. TOML config: {} (km24_api_key = \"your-key\")",
        ENV_API_KEY,
        default_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "km24-agent.toml".to_string())
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default TOML location: `<config_dir>/km24/km24-agent.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("km24").join("km24-agent.toml"))
}

/// Load TOML configuration
///
/// An explicitly requested file must exist and parse. When no path is given
/// the default location is tried; a missing default file yields defaults.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit_path {
        return read_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => read_toml_config(&path),
        _ => {
            info!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Fold a `.env` file from the working directory into the process environment
///
/// Variables already set in the environment win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}
