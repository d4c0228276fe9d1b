//! Configuration loader
//!
//! Loads the platform configuration from environment variables or files.
//! This is the only place in the workspace that reads the environment; the
//! client itself is always built from a [`PlatformConfig`] value.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required ones are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `CASPIO_ACCOUNT_DOMAIN`: Account domain (e.g. `c1abc123.caspio.com`)
//! - `CASPIO_CLIENT_ID`: OAuth client id
//! - `CASPIO_CLIENT_SECRET`: OAuth client secret
//!
//! Optional:
//! - `CASPIO_TOKEN_URL`, `CASPIO_API_BASE_URL`: Endpoint overrides
//! - `CASPIO_PAGE_LIMIT`, `CASPIO_MAX_PAGES`: Pagination defaults
//! - `CASPIO_REQUEST_TIMEOUT_MS`, `CASPIO_TOTAL_TIMEOUT_MS`: Timeouts
//! - `CASPIO_TOKEN_BUFFER_SECS`, `CASPIO_TOKEN_TIMEOUT_MS`: Token cache
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./caspio.{json,toml}` then `./config.{json,toml}`
//! 2. The same names in the parent directory
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use caspio_proxy_domain::{PlatformConfig, PlatformError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["caspio.json", "caspio.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file. The
/// result is validated either way.
///
/// # Errors
/// Returns `PlatformError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or values are out of range
pub fn load() -> Result<PlatformConfig> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `PlatformError::Config` if required variables are missing
/// or optional ones have invalid values.
pub fn load_from_env() -> Result<PlatformConfig> {
    let mut config = PlatformConfig::new(
        env_var("CASPIO_ACCOUNT_DOMAIN")?,
        env_var("CASPIO_CLIENT_ID")?,
        env_var("CASPIO_CLIENT_SECRET")?,
    );

    config.token_url = std::env::var("CASPIO_TOKEN_URL").ok().filter(|v| !v.trim().is_empty());
    config.api_base_url =
        std::env::var("CASPIO_API_BASE_URL").ok().filter(|v| !v.trim().is_empty());

    if let Some(v) = env_parse("CASPIO_PAGE_LIMIT")? {
        config.pagination.page_limit = v;
    }
    if let Some(v) = env_parse("CASPIO_MAX_PAGES")? {
        config.pagination.max_pages = v;
    }
    if let Some(v) = env_parse("CASPIO_REQUEST_TIMEOUT_MS")? {
        config.pagination.request_timeout_ms = v;
    }
    if let Some(v) = env_parse("CASPIO_TOTAL_TIMEOUT_MS")? {
        config.pagination.total_timeout_ms = v;
    }
    if let Some(v) = env_parse("CASPIO_TOKEN_BUFFER_SECS")? {
        config.auth.token_buffer_secs = v;
    }
    if let Some(v) = env_parse("CASPIO_TOKEN_TIMEOUT_MS")? {
        config.auth.token_timeout_ms = v;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PlatformError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<PlatformConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PlatformError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PlatformError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PlatformError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<PlatformConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PlatformError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PlatformError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PlatformError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PlatformError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable
///
/// Unset or blank yields `None`; a present but unparsable value is an error.
fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PlatformError::Config(format!("Invalid value for {key}: {e}"))),
        _ => Ok(None),
    }
}
