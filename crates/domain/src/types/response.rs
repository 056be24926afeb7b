//! Response-side types: the normalized outcome of one call

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    CREDENTIAL_EXPIRED_MESSAGE, DISPATCH_ABORTED_MESSAGE, RETRY_BUDGET_EXCEEDED_MESSAGE,
    TRANSPORT_FAULT_STATUS, UNAUTHORIZED_STATUS,
};
use crate::errors::{GameLinkError, Result};
use crate::impl_wire_enum_conversions;

/// Structured error object the backend returns on failure.
///
/// Parsed best-effort; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
    /// Positive value marks the response as rate limited.
    #[serde(default)]
    pub retry_after_seconds: Option<i64>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub doc_url: Option<String>,
}

impl ApiErrorBody {
    /// Error body with only a message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }

    /// Parse an error object out of a response body.
    ///
    /// Returns `None` when the text is not a JSON object or carries none of
    /// the recognised fields.
    pub fn parse(raw_text: &str) -> Option<Self> {
        let parsed: Self = serde_json::from_str(raw_text).ok()?;
        let empty = parsed.message.is_empty()
            && parsed.code.is_none()
            && parsed.retry_after_seconds.is_none()
            && parsed.request_id.is_none();
        (!empty).then_some(parsed)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Why the pipeline produced an envelope itself instead of passing the
/// server's response through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// Refreshed as often as allowed and the server still rejects the token,
    /// or the silent refresh was rejected by the server.
    CredentialExpired,
    /// Silent refresh impossible: the user has to authenticate interactively
    /// (second factor required, or no stored credentials).
    InteractiveReauthRequired,
    /// Rate-limit replays exhausted.
    RetryBudgetExceeded,
    /// The descriptor could not be turned into a URL.
    InvalidRequest,
    /// The dispatch task died before producing a response.
    DispatchAborted,
}

impl_wire_enum_conversions!(TerminalReason {
    CredentialExpired => "credential_expired",
    InteractiveReauthRequired => "interactive_reauth_required",
    RetryBudgetExceeded => "retry_budget_exceeded",
    InvalidRequest => "invalid_request",
    DispatchAborted => "dispatch_aborted",
});

/// Coarse classification of a failed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Server never reached (DNS, connect, timeout)
    Transport,
    /// 401 that survived the refresh path
    AuthenticationExpired,
    /// Server asked for a delayed retry
    RateLimited,
    /// Any other non-2xx response, passed through untouched
    Application,
}

/// Normalized result of any call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// Transport succeeded and status is 2xx
    pub success: bool,
    /// HTTP status; 0 when the server was never reached
    pub status_code: u16,
    /// Body exactly as received, empty when absent
    pub raw_text: String,
    /// Best-effort parsed error, only on failures
    pub error: Option<ApiErrorBody>,
    /// Set for uploads so out-of-band completions can be matched
    pub correlation_id: Option<String>,
    /// Response headers, names lower-cased
    pub headers: Vec<(String, String)>,
    /// Refresh-retry cycles the call went through
    pub auth_retries: u32,
    /// Rate-limit replays the call went through
    pub rate_limit_retries: u32,
    /// Set only when the pipeline synthesized this envelope
    pub terminal: Option<TerminalReason>,
}

impl ResponseEnvelope {
    /// Normalize a response that reached the server.
    pub fn from_http(
        status_code: u16,
        headers: Vec<(String, String)>,
        raw_text: impl Into<String>,
        correlation_id: Option<String>,
    ) -> Self {
        let raw_text = raw_text.into();
        let success = (200..300).contains(&status_code);
        let error = if success { None } else { ApiErrorBody::parse(&raw_text) };

        Self {
            success,
            status_code,
            raw_text,
            error,
            correlation_id,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            ..Self::default()
        }
    }

    /// A call that never reached the server.
    pub fn transport_fault(message: impl Into<String>, correlation_id: Option<String>) -> Self {
        Self {
            success: false,
            status_code: TRANSPORT_FAULT_STATUS,
            error: Some(ApiErrorBody::with_message(message)),
            correlation_id,
            ..Self::default()
        }
    }

    /// An envelope synthesized by the pipeline for a terminal state.
    pub fn terminal(reason: TerminalReason, correlation_id: Option<String>) -> Self {
        let (status_code, message) = match reason {
            TerminalReason::CredentialExpired | TerminalReason::InteractiveReauthRequired => {
                (UNAUTHORIZED_STATUS, CREDENTIAL_EXPIRED_MESSAGE)
            }
            TerminalReason::RetryBudgetExceeded => {
                (TRANSPORT_FAULT_STATUS, RETRY_BUDGET_EXCEEDED_MESSAGE)
            }
            TerminalReason::InvalidRequest => (TRANSPORT_FAULT_STATUS, "invalid request"),
            TerminalReason::DispatchAborted => (TRANSPORT_FAULT_STATUS, DISPATCH_ABORTED_MESSAGE),
        };

        Self {
            success: false,
            status_code,
            error: Some(ApiErrorBody::with_message(message)),
            correlation_id,
            terminal: Some(reason),
            ..Self::default()
        }
    }

    /// Replace the synthesized error message, keeping everything else.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error = Some(ApiErrorBody::with_message(message));
        self
    }

    #[must_use]
    pub fn with_auth_retries(mut self, auth_retries: u32) -> Self {
        self.auth_retries = auth_retries;
        self
    }

    #[must_use]
    pub fn with_rate_limit_retries(mut self, rate_limit_retries: u32) -> Self {
        self.rate_limit_retries = rate_limit_retries;
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == UNAUTHORIZED_STATUS
    }

    /// Server-imposed delay, present only on failed envelopes carrying a
    /// positive `retry_after_seconds`.
    pub fn retry_after(&self) -> Option<Duration> {
        if self.success {
            return None;
        }
        let seconds = self.error.as_ref()?.retry_after_seconds?;
        u64::try_from(seconds).ok().filter(|s| *s > 0).map(Duration::from_secs)
    }

    /// Classify a failure. `None` for successful envelopes.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.success {
            return None;
        }
        Some(match self.terminal {
            Some(TerminalReason::CredentialExpired | TerminalReason::InteractiveReauthRequired) => {
                FailureKind::AuthenticationExpired
            }
            Some(TerminalReason::RetryBudgetExceeded) => FailureKind::RateLimited,
            Some(TerminalReason::InvalidRequest | TerminalReason::DispatchAborted) => {
                FailureKind::Transport
            }
            None if self.status_code == TRANSPORT_FAULT_STATUS => FailureKind::Transport,
            None if self.retry_after().is_some() => FailureKind::RateLimited,
            None if self.is_unauthorized() => FailureKind::AuthenticationExpired,
            None => FailureKind::Application,
        })
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str()).filter(|m| !m.is_empty())
    }

    /// Case-insensitive response header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decode the body of a successful envelope.
    ///
    /// # Errors
    ///
    /// Returns `GameLinkError::Network` for failed envelopes and
    /// `GameLinkError::Serialization` when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if !self.success {
            return Err(GameLinkError::Network(format!(
                "status {}: {}",
                self.status_code,
                self.error_message().unwrap_or("request failed")
            )));
        }
        let text = if self.raw_text.is_empty() { "null" } else { self.raw_text.as_str() };
        Ok(serde_json::from_str(text)?)
    }
}
