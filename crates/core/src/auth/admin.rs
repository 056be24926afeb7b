//! Admin login refresh
//!
//! Admin tokens come from an email/password login. Accounts with a second
//! factor get an `mfa_key` instead of a token; those cannot be refreshed
//! silently and the refresh fails straight away.

use async_trait::async_trait;
use gamelink_domain::constants::{ADMIN_LOGIN_PATH, ADMIN_TWO_FACTOR_PATH};
use gamelink_domain::{
    AdminCredentials, AdminLoginRequest, AdminLoginResponse, AdminTwoFactorRequest,
    CredentialDomain, RequestDescriptor,
};
use tracing::{info, instrument};

use super::{send_unauthenticated, RefreshFailure};
use crate::credentials::CredentialSlot;
use crate::dispatch::ports::{RefreshStrategy, Transport};

/// Silent refresh for the admin domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminLoginRefresh;

impl AdminLoginRefresh {
    pub fn new() -> Self {
        Self
    }

    /// Run the email/password login.
    ///
    /// The returned response has either an `auth_token` or an `mfa_key`.
    ///
    /// # Errors
    ///
    /// `Rejected` when the server refuses, `Malformed` when the response
    /// carries neither field.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        transport: &dyn Transport,
        slot: &CredentialSlot,
        credentials: &AdminCredentials,
    ) -> Result<AdminLoginResponse, RefreshFailure> {
        let body = AdminLoginRequest { email: &credentials.email, password: &credentials.password };
        let descriptor = RequestDescriptor::post(ADMIN_LOGIN_PATH)
            .unauthenticated()
            .json(&body)
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?
            .build();

        let envelope = send_unauthenticated(transport, slot, &descriptor).await;
        if !envelope.success {
            return Err(RefreshFailure::rejected(&envelope));
        }

        let response: AdminLoginResponse =
            envelope.json().map_err(|e| RefreshFailure::Malformed(e.to_string()))?;
        let has_token = response.auth_token.as_deref().is_some_and(|t| !t.is_empty());
        if !has_token && response.mfa_key.is_none() {
            return Err(RefreshFailure::Malformed(
                "login response has neither auth_token nor mfa_key".to_string(),
            ));
        }

        Ok(response)
    }

    /// Confirm a pending login with the user's second-factor code.
    ///
    /// # Errors
    ///
    /// `Rejected` for a wrong or expired code, `Malformed` when no token is
    /// returned.
    #[instrument(skip_all)]
    pub async fn verify_second_factor(
        &self,
        transport: &dyn Transport,
        slot: &CredentialSlot,
        mfa_key: &str,
        secret: &str,
    ) -> Result<String, RefreshFailure> {
        let descriptor = RequestDescriptor::post(ADMIN_TWO_FACTOR_PATH)
            .unauthenticated()
            .json(&AdminTwoFactorRequest { mfa_key, secret })
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?
            .build();

        let envelope = send_unauthenticated(transport, slot, &descriptor).await;
        if !envelope.success {
            return Err(RefreshFailure::rejected(&envelope));
        }

        let response: AdminLoginResponse =
            envelope.json().map_err(|e| RefreshFailure::Malformed(e.to_string()))?;
        response
            .auth_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RefreshFailure::Malformed("verification returned no auth_token".into()))
    }
}

#[async_trait]
impl RefreshStrategy for AdminLoginRefresh {
    fn domain(&self) -> CredentialDomain {
        CredentialDomain::Admin
    }

    async fn reauthenticate(
        &self,
        transport: &dyn Transport,
        slot: &CredentialSlot,
    ) -> Result<String, RefreshFailure> {
        let credentials = slot.admin_credentials().await.ok_or(RefreshFailure::MissingCredentials)?;
        let response = self.login(transport, slot, &credentials).await?;

        if let Some(mfa_key) = response.mfa_key {
            info!("admin account requires a second factor, silent refresh not possible");
            return Err(RefreshFailure::SecondFactorRequired { mfa_key });
        }

        response
            .auth_token
            .ok_or_else(|| RefreshFailure::Malformed("login returned no auth_token".into()))
    }
}
