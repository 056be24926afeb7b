//! Player session refresh
//!
//! Player tokens are session tokens minted by a session-start call keyed on
//! the device/player identifier. No user interaction is involved, so a
//! player session can always be refreshed in the background.

use async_trait::async_trait;
use gamelink_domain::constants::PLAYER_SESSION_PATH;
use gamelink_domain::{
    CredentialDomain, PlayerCredentials, PlayerSessionRequest, PlayerSessionResponse,
    RequestDescriptor,
};
use tracing::{debug, instrument};

use super::{send_unauthenticated, RefreshFailure};
use crate::credentials::CredentialSlot;
use crate::dispatch::ports::{RefreshStrategy, Transport};

/// Silent refresh for the player domain.
#[derive(Debug, Clone)]
pub struct PlayerSessionRefresh {
    game_key: String,
    game_version: String,
    platform: String,
}

impl PlayerSessionRefresh {
    pub fn new(
        game_key: impl Into<String>,
        game_version: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            game_key: game_key.into(),
            game_version: game_version.into(),
            platform: platform.into(),
        }
    }

    /// Run the session-start call for `credentials` against `slot`'s root.
    ///
    /// # Errors
    ///
    /// `Rejected` when the server refuses, `Malformed` when the response
    /// has no usable session token.
    #[instrument(skip_all)]
    pub async fn start_session(
        &self,
        transport: &dyn Transport,
        slot: &CredentialSlot,
        credentials: &PlayerCredentials,
    ) -> Result<PlayerSessionResponse, RefreshFailure> {
        let body = PlayerSessionRequest {
            game_key: &self.game_key,
            player_identifier: &credentials.player_identifier,
            game_version: &self.game_version,
            platform: &self.platform,
        };
        let descriptor = RequestDescriptor::post(PLAYER_SESSION_PATH)
            .unauthenticated()
            .json(&body)
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?
            .build();

        let envelope = send_unauthenticated(transport, slot, &descriptor).await;
        if !envelope.success {
            return Err(RefreshFailure::rejected(&envelope));
        }

        let session: PlayerSessionResponse =
            envelope.json().map_err(|e| RefreshFailure::Malformed(e.to_string()))?;
        if session.session_token.is_empty() {
            return Err(RefreshFailure::Malformed("empty session token".to_string()));
        }

        debug!(player_id = ?session.player_id, "player session started");
        Ok(session)
    }
}

#[async_trait]
impl RefreshStrategy for PlayerSessionRefresh {
    fn domain(&self) -> CredentialDomain {
        CredentialDomain::Player
    }

    async fn reauthenticate(
        &self,
        transport: &dyn Transport,
        slot: &CredentialSlot,
    ) -> Result<String, RefreshFailure> {
        let credentials = slot.player_credentials().await.ok_or(RefreshFailure::MissingCredentials)?;
        let session = self.start_session(transport, slot, &credentials).await?;
        Ok(session.session_token)
    }
}
