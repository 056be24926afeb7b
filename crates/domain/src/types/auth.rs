//! Authentication payloads and stored refresh material
//!
//! These are the only endpoint payloads the crate defines: the calls the
//! silent-refresh strategies and the initial login flows make.

use serde::{Deserialize, Serialize};

/// Material needed to silently mint a new player session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCredentials {
    /// Device or account identifier the session is started for
    pub player_identifier: String,
}

/// Material needed to silently log an administrator back in.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of the player session-start call.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSessionRequest<'a> {
    pub game_key: &'a str,
    pub player_identifier: &'a str,
    pub game_version: &'a str,
    pub platform: &'a str,
}

/// Response of the player session-start call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerSessionResponse {
    pub session_token: String,
    #[serde(default)]
    pub player_id: Option<u64>,
    #[serde(default)]
    pub player_identifier: Option<String>,
    #[serde(default)]
    pub seen_before: bool,
}

/// Body of the admin login call.
#[derive(Clone, Serialize)]
pub struct AdminLoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of the admin login call.
///
/// Exactly one of `auth_token` and `mfa_key` is expected. An `mfa_key`
/// means a second factor has to be confirmed before a token is issued.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminLoginResponse {
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub mfa_key: Option<String>,
}

/// Body of the admin second-factor verification call.
#[derive(Debug, Clone, Serialize)]
pub struct AdminTwoFactorRequest<'a> {
    pub mfa_key: &'a str,
    pub secret: &'a str,
}

/// Result of an interactive admin login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminLoginOutcome {
    /// Token issued and stored
    Authenticated,
    /// Call [`AdminTwoFactorRequest`]-style verification with this key
    SecondFactorRequired { mfa_key: String },
}
