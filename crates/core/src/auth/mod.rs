//! Authentication: silent refresh strategies and the login flows
//!
//! - [`PlayerSessionRefresh`] re-starts a player session from the stored
//!   device identifier.
//! - [`AdminLoginRefresh`] re-runs the admin email/password login and gives
//!   up when the account needs an interactive second factor.
//! - [`SessionService`] is the initial-login path and, with the refresh
//!   coordinator, the only writer of tokens.

pub mod admin;
pub mod player;
pub mod session;

use gamelink_domain::{
    CredentialDomain, GameLinkError, RequestDescriptor, ResolvedRequest, ResponseEnvelope,
    TerminalReason,
};
use thiserror::Error;

pub use admin::AdminLoginRefresh;
pub use player::PlayerSessionRefresh;
pub use session::SessionService;

use crate::credentials::CredentialSlot;
use crate::dispatch::ports::Transport;
use crate::dispatch::url::{merge_headers, resolve_url};

/// Why a re-authentication attempt did not produce a token
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshFailure {
    #[error("no refresh strategy registered for the {0} domain")]
    NoStrategy(CredentialDomain),

    #[error("no stored credentials to refresh with")]
    MissingCredentials,

    #[error("second factor required")]
    SecondFactorRequired { mfa_key: String },

    #[error("re-authentication rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed re-authentication response: {0}")]
    Malformed(String),
}

impl RefreshFailure {
    /// Build a `Rejected` failure from a failed envelope.
    pub fn rejected(envelope: &ResponseEnvelope) -> Self {
        Self::Rejected {
            status: envelope.status_code,
            message: envelope.error_message().unwrap_or("no error message").to_string(),
        }
    }

    /// Terminal state the dispatch pipeline reports for this failure.
    ///
    /// Failures that only a user can fix (no stored credentials, second
    /// factor) are reported separately from a server that rejected the
    /// refresh.
    pub fn terminal_reason(&self) -> TerminalReason {
        match self {
            Self::NoStrategy(_) | Self::MissingCredentials | Self::SecondFactorRequired { .. } => {
                TerminalReason::InteractiveReauthRequired
            }
            Self::Rejected { .. } | Self::Malformed(_) => TerminalReason::CredentialExpired,
        }
    }
}

impl From<RefreshFailure> for GameLinkError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::SecondFactorRequired { mfa_key } => Self::SecondFactorRequired(mfa_key),
            RefreshFailure::Rejected { status: 0, message } => Self::Network(message),
            RefreshFailure::Malformed(message) => Self::Serialization(message),
            other => Self::Auth(other.to_string()),
        }
    }
}

/// Send an authentication call for `slot`'s domain without attaching its
/// token.
pub(crate) async fn send_unauthenticated(
    transport: &dyn Transport,
    slot: &CredentialSlot,
    descriptor: &RequestDescriptor,
) -> ResponseEnvelope {
    let base_url = slot.base_url().await;
    let url = match resolve_url(&base_url, descriptor) {
        Ok(url) => url,
        Err(err) => {
            return ResponseEnvelope::terminal(TerminalReason::InvalidRequest, None)
                .with_error_message(err.to_string())
        }
    };

    let request = ResolvedRequest {
        method: descriptor.method(),
        url,
        headers: merge_headers(slot.default_headers(), descriptor.headers(), None),
        body: descriptor.body().clone(),
        correlation_id: None,
    };

    transport.send(request).await
}
