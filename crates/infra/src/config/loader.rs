//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `GAMELINK_GAME_KEY` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GAMELINK_GAME_KEY`: Game key (required)
//! - `GAMELINK_ENVIRONMENT`: `live` or `stage`
//! - `GAMELINK_GAME_URL`: Game-facing API root of the selected environment
//! - `GAMELINK_ADMIN_URL`: Admin-facing API root of the selected environment
//! - `GAMELINK_GAME_VERSION`: Version reported when starting sessions
//! - `GAMELINK_PLATFORM`: Platform reported when starting sessions
//! - `GAMELINK_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `GAMELINK_MAX_AUTH_RETRIES`: Refresh-and-replay cycles per request
//! - `GAMELINK_MAX_RATE_LIMIT_RETRIES`: Rate-limit replays per request
//! - `GAMELINK_LOG_LEVEL`: Default log filter
//! - `GAMELINK_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./gamelink.json` or `./gamelink.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../gamelink.json` or `../gamelink.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use gamelink_domain::{Config, Environment, GameLinkError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the game key is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `GameLinkError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `GAMELINK_GAME_KEY` is required; everything else falls back to the
/// defaults of [`Config::new`].
///
/// # Errors
/// Returns `GameLinkError::Config` if the game key is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::new(env_var("GAMELINK_GAME_KEY")?);

    if let Some(environment) = optional_env("GAMELINK_ENVIRONMENT") {
        config.environment = Environment::from_str(&environment).map_err(GameLinkError::Config)?;
    }

    let roots = match config.environment {
        Environment::Live => &mut config.endpoints.live,
        Environment::Stage => &mut config.endpoints.stage,
    };
    if let Some(url) = optional_env("GAMELINK_GAME_URL") {
        roots.game_url = url;
    }
    if let Some(url) = optional_env("GAMELINK_ADMIN_URL") {
        roots.admin_url = url;
    }

    if let Some(version) = optional_env("GAMELINK_GAME_VERSION") {
        config.game_version = version;
    }
    if let Some(platform) = optional_env("GAMELINK_PLATFORM") {
        config.platform = platform;
    }

    if let Some(timeout) = env_parse::<u64>("GAMELINK_TIMEOUT_SECS")? {
        config.http.timeout_secs = timeout;
    }
    if let Some(retries) = env_parse::<u32>("GAMELINK_MAX_AUTH_RETRIES")? {
        config.retry.max_auth_retries = retries;
    }
    if let Some(retries) = env_parse::<u32>("GAMELINK_MAX_RATE_LIMIT_RETRIES")? {
        config.retry.max_rate_limit_retries = retries;
    }

    if let Some(level) = optional_env("GAMELINK_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("GAMELINK_LOG_JSON", config.logging.json);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `GameLinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or the configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GameLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GameLinkError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GameLinkError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GameLinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GameLinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(GameLinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent, then the directory
/// of the running executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["gamelink.json", "gamelink.toml", "config.json", "config.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `GameLinkError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| GameLinkError::Config(format!("Missing required environment variable: {key}")))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| GameLinkError::Config(format!("Invalid value for {key}: {e}")))
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
