//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `RELAY_BASE_URL` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every field has a default, so a file only needs the values it changes.
//!
//! ## Environment Variables
//! - `RELAY_BASE_URL`: Base URL for relative request paths (required)
//! - `RELAY_TIMEOUT_MS`: Per-attempt transport timeout in milliseconds
//! - `RELAY_LOG_REQUESTS`: Log every successful call (true/false)
//! - `RELAY_CSRF_HEADER`: Header carrying the CSRF token
//! - `RELAY_USER_AGENT`: User agent sent with every request
//! - `RELAY_MAX_RETRIES`: Transient-network retry budget per call
//! - `RELAY_REFRESH_PATH`: Token refresh endpoint
//! - `RELAY_LOGIN_REDIRECT`: Where the UI goes after the session ends
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./relay.toml` or `./relay.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use relay_domain::{ClientConfig, RelayError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["relay.toml", "relay.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// Environment variables win when `RELAY_BASE_URL` is set; otherwise the
/// first probed config file is loaded, and defaults apply when there is none.
///
/// # Errors
/// Returns `RelayError::Config` if:
/// - `RELAY_BASE_URL` is set but another `RELAY_*` variable is invalid
/// - A probed config file cannot be read
/// - File format is invalid
/// - The loaded values fail validation
pub fn load() -> Result<ClientConfig> {
    if env_opt("RELAY_BASE_URL").is_none() {
        return match probe_config_paths() {
            Some(path) => load_from_file(Some(path)),
            None => {
                tracing::debug!("no RELAY_BASE_URL and no config file, using defaults");
                Ok(ClientConfig::default())
            }
        };
    }

    let config = load_from_env()?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `RELAY_BASE_URL` is required; unset optional variables keep their
/// defaults.
///
/// # Errors
/// Returns `RelayError::Config` if `RELAY_BASE_URL` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig { base_url: env_var("RELAY_BASE_URL")?, ..Default::default() };

    if let Some(timeout_ms) = env_parse::<u64>("RELAY_TIMEOUT_MS")? {
        config.timeout_ms = timeout_ms;
    }
    config.log_requests = env_bool("RELAY_LOG_REQUESTS", config.log_requests);
    if let Some(header) = env_opt("RELAY_CSRF_HEADER") {
        config.csrf_header = header;
    }
    config.user_agent = env_opt("RELAY_USER_AGENT").or(config.user_agent);
    if let Some(max_retries) = env_parse::<u32>("RELAY_MAX_RETRIES")? {
        config.retry.max_retries = max_retries;
    }
    if let Some(path) = env_opt("RELAY_REFRESH_PATH") {
        config.auth.refresh_path = path;
    }
    if let Some(redirect) = env_opt("RELAY_LOGIN_REDIRECT") {
        config.auth.login_redirect = redirect;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `RelayError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The loaded values fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RelayError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RelayError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `RelayError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RelayError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RelayError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(RelayError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, then the executable's
/// directory, for `relay.{toml,json}` and `config.{toml,json}`.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut directories = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        directories.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            directories.push(exe_dir.to_path_buf());
        }
    }

    directories
        .iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `RelayError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| RelayError::Config(format!("Missing required environment variable: {}", key)))
}

/// Optional environment variable; empty values count as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `RelayError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| RelayError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
