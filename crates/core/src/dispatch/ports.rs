//! Port interfaces for the dispatch pipeline

use async_trait::async_trait;
use gamelink_domain::{CredentialDomain, ResolvedRequest, ResponseEnvelope};

use crate::auth::RefreshFailure;
use crate::credentials::CredentialSlot;

/// Performs the actual network exchange.
///
/// Implementations must not fail for HTTP error statuses: a 4xx/5xx is an
/// ordinary envelope. Faults that never reach the server (DNS, refused
/// connection, timeout) come back as an envelope with `status_code == 0`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one fully resolved request.
    async fn send(&self, request: ResolvedRequest) -> ResponseEnvelope;
}

/// Silent re-authentication for one credential domain.
#[async_trait]
pub trait RefreshStrategy: Send + Sync {
    /// Domain this strategy mints tokens for.
    fn domain(&self) -> CredentialDomain;

    /// Obtain a fresh token using the material stored in `slot`.
    ///
    /// Must not write the slot; the coordinator stores the returned token.
    async fn reauthenticate(
        &self,
        transport: &dyn Transport,
        slot: &CredentialSlot,
    ) -> Result<String, RefreshFailure>;
}
