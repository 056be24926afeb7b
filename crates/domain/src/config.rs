//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_RATE_LIMIT_DELAY_SECS, DEFAULT_TIMEOUT_SECS, MAX_AUTH_RETRIES,
    MAX_RATE_LIMIT_RETRIES,
};
use crate::errors::{GameLinkError, Result};
use crate::impl_wire_enum_conversions;

/// Backend environment the client talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Live,
    Stage,
}

impl_wire_enum_conversions!(Environment {
    Live => "live",
    Stage => "stage",
});

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    pub game_key: String,
    #[serde(default = "default_game_version")]
    pub game_version: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API roots per environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub live: EndpointRoots,
    pub stage: EndpointRoots,
}

/// Game-facing and admin-facing roots of one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRoots {
    pub game_url: String,
    pub admin_url: String,
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Retry limits of the dispatch pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_auth_retries: u32,
    pub max_rate_limit_retries: u32,
    pub max_rate_limit_delay_secs: u64,
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"gamelink_core=debug"`
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_game_version() -> String {
    "0.0.0".to_string()
}

fn default_platform() -> String {
    "desktop".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            live: EndpointRoots {
                game_url: "https://api.gamelink.example/game".to_string(),
                admin_url: "https://api.gamelink.example/admin".to_string(),
            },
            stage: EndpointRoots {
                game_url: "https://stage.api.gamelink.example/game".to_string(),
                admin_url: "https://stage.api.gamelink.example/admin".to_string(),
            },
        }
    }
}

impl EndpointConfig {
    /// Roots for `environment`.
    pub fn roots(&self, environment: Environment) -> &EndpointRoots {
        match environment {
            Environment::Live => &self.live,
            Environment::Stage => &self.stage,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: DEFAULT_TIMEOUT_SECS, user_agent: None }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_auth_retries: MAX_AUTH_RETRIES,
            max_rate_limit_retries: MAX_RATE_LIMIT_RETRIES,
            max_rate_limit_delay_secs: DEFAULT_MAX_RATE_LIMIT_DELAY_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl Config {
    /// Configuration with default endpoints for `game_key`.
    pub fn new(game_key: impl Into<String>) -> Self {
        Self {
            environment: Environment::default(),
            game_key: game_key.into(),
            game_version: default_game_version(),
            platform: default_platform(),
            endpoints: EndpointConfig::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Roots of the currently selected environment.
    pub fn active_roots(&self) -> &EndpointRoots {
        self.endpoints.roots(self.environment)
    }

    /// Reject configurations the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `GameLinkError::Config` for an empty game key, a zero
    /// timeout, or an endpoint root that is not an http(s) URL.
    pub fn validate(&self) -> Result<()> {
        if self.game_key.trim().is_empty() {
            return Err(GameLinkError::Config("game_key must not be empty".to_string()));
        }
        if self.http.timeout_secs == 0 {
            return Err(GameLinkError::Config("http.timeout_secs must be positive".to_string()));
        }

        for (name, roots) in [("live", &self.endpoints.live), ("stage", &self.endpoints.stage)] {
            for url in [&roots.game_url, &roots.admin_url] {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(GameLinkError::Config(format!(
                        "endpoint '{url}' for environment {name} is not an http(s) URL"
                    )));
                }
            }
        }

        Ok(())
    }
}
