//! Error types used throughout the workspace
//!
//! The dispatch pipeline itself never fails: every outcome of a network call
//! is a [`crate::ResponseEnvelope`]. `GameLinkError` covers everything around
//! it (configuration, transport construction, login flows, decoding).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for GameLink
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GameLinkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// Admin login needs an interactive second factor; carries the MFA key
    /// the verification call must echo back.
    #[error("Second factor required")]
    SecondFactorRequired(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Categories of errors, used to decide whether a caller may retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials rejected or missing
    Authentication,
    /// Connection, DNS or timeout failures
    Network,
    /// Malformed input or payloads
    Client,
    /// Configuration problems, fixed by changing config not by retrying
    Config,
    /// Bugs and invariant violations
    Internal,
}

impl GameLinkError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) | Self::SecondFactorRequired(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Serialization(_) | Self::InvalidInput(_) => ErrorCategory::Client,
            Self::Config(_) => ErrorCategory::Config,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Check if retrying the same operation could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }

    /// Stable label suitable for log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::SecondFactorRequired(_) => "second_factor_required",
            Self::Serialization(_) => "serialization",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for GameLinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for GameLink operations
pub type Result<T> = std::result::Result<T, GameLinkError>;
