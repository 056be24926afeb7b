//! Interactive login flows
//!
//! [`SessionService`] performs the first authentication of each domain and
//! stores the resulting token together with the material later silent
//! refreshes need.

use std::sync::Arc;

use gamelink_domain::{
    AdminCredentials, AdminLoginOutcome, CredentialDomain, PlayerCredentials,
    PlayerSessionResponse, Result,
};
use tracing::{info, instrument};

use super::{AdminLoginRefresh, PlayerSessionRefresh};
use crate::credentials::CredentialStore;
use crate::dispatch::ports::Transport;

pub struct SessionService {
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialStore>,
    player: PlayerSessionRefresh,
    admin: AdminLoginRefresh,
}

impl SessionService {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialStore>,
        player: PlayerSessionRefresh,
    ) -> Self {
        Self { transport, credentials, player, admin: AdminLoginRefresh::new() }
    }

    /// Start a player session and remember the identifier for later
    /// refreshes.
    ///
    /// # Errors
    ///
    /// `Auth` when the server refuses the session, `Network` when it cannot
    /// be reached.
    #[instrument(skip_all)]
    pub async fn start_player_session(
        &self,
        player_identifier: impl Into<String>,
    ) -> Result<PlayerSessionResponse> {
        let credentials = PlayerCredentials { player_identifier: player_identifier.into() };
        let slot = self.credentials.player();

        let session = self.player.start_session(self.transport.as_ref(), slot, &credentials).await?;

        slot.store_player_credentials(credentials).await;
        slot.set_token(session.session_token.clone()).await;
        info!(player_id = ?session.player_id, "player session established");

        Ok(session)
    }

    /// Log an admin in with email and password.
    ///
    /// Credentials are stored either way so a later silent refresh can try
    /// again; for second-factor accounts that refresh reports that
    /// interactive login is needed.
    ///
    /// # Errors
    ///
    /// `Auth` when the login is refused, `Network` when the server cannot be
    /// reached.
    #[instrument(skip_all)]
    pub async fn admin_login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AdminLoginOutcome> {
        let credentials = AdminCredentials { email: email.into(), password: password.into() };
        let slot = self.credentials.admin();

        let response = self.admin.login(self.transport.as_ref(), slot, &credentials).await?;
        slot.store_admin_credentials(credentials).await;

        if let Some(mfa_key) = response.mfa_key {
            info!("admin login waiting for second factor");
            return Ok(AdminLoginOutcome::SecondFactorRequired { mfa_key });
        }

        if let Some(token) = response.auth_token {
            slot.set_token(token).await;
        }
        info!("admin logged in");
        Ok(AdminLoginOutcome::Authenticated)
    }

    /// Complete a login that returned [`AdminLoginOutcome::SecondFactorRequired`].
    ///
    /// # Errors
    ///
    /// `Auth` for a wrong or expired code.
    #[instrument(skip_all)]
    pub async fn verify_admin_second_factor(&self, mfa_key: &str, code: &str) -> Result<()> {
        let slot = self.credentials.admin();
        let token =
            self.admin.verify_second_factor(self.transport.as_ref(), slot, mfa_key, code).await?;
        slot.set_token(token).await;
        info!("admin second factor verified");
        Ok(())
    }

    /// Forget the token and stored credentials of `domain`.
    pub async fn logout(&self, domain: CredentialDomain) {
        if let Some(slot) = self.credentials.slot(domain) {
            slot.clear().await;
            info!(domain = %domain, "logged out");
        }
    }

    pub async fn is_authenticated(&self, domain: CredentialDomain) -> bool {
        match self.credentials.slot(domain) {
            Some(slot) => slot.is_authenticated().await,
            None => true,
        }
    }
}
