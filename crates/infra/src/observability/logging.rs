//! Tracing subscriber setup

use gamelink_domain::{GameLinkError, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the log filter: `RUST_LOG` when set, otherwise the configured
/// level.
///
/// # Errors
///
/// Returns `GameLinkError::Config` when the configured directive does not
/// parse.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            GameLinkError::Config(format!("invalid log level '{}': {e}", config.level))
        }),
    }
}

/// Install the global tracing subscriber.
///
/// Returns `Ok(false)` without touching anything when a subscriber is
/// already installed, so embedders that set up their own logging keep it.
///
/// # Errors
///
/// Returns `GameLinkError::Config` for an invalid log level.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().compact().with_target(false)).try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "tracing initialised");
    }
    Ok(installed)
}
