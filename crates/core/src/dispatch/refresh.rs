//! Token refresh coordination
//!
//! A 401 on an authenticated domain means the token is stale. The
//! coordinator re-authenticates the domain once per staleness, no matter
//! how many requests hit the 401 concurrently: refreshes are serialized on
//! the slot's refresh gate, and a waiter that finds the token already
//! replaced skips straight to its replay.

use std::sync::Arc;

use gamelink_domain::{CredentialDomain, RequestDescriptor, ResponseEnvelope, TerminalReason};
use tracing::{debug, info, instrument, warn};

use super::ports::{RefreshStrategy, Transport};
use super::Dispatcher;
use crate::auth::RefreshFailure;
use crate::credentials::CredentialStore;

/// Owns the refresh strategies and performs refresh-then-replay cycles.
pub struct RefreshCoordinator {
    credentials: Arc<CredentialStore>,
    transport: Arc<dyn Transport>,
    strategies: Vec<Arc<dyn RefreshStrategy>>,
}

impl RefreshCoordinator {
    pub fn new(credentials: Arc<CredentialStore>, transport: Arc<dyn Transport>) -> Self {
        Self { credentials, transport, strategies: Vec::new() }
    }

    /// Register `strategy` for its domain, replacing any earlier one.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn RefreshStrategy>) -> Self {
        self.strategies.retain(|existing| existing.domain() != strategy.domain());
        self.strategies.push(strategy);
        self
    }

    pub fn has_strategy(&self, domain: CredentialDomain) -> bool {
        self.strategy_for(domain).is_some()
    }

    fn strategy_for(&self, domain: CredentialDomain) -> Option<&Arc<dyn RefreshStrategy>> {
        self.strategies.iter().find(|strategy| strategy.domain() == domain)
    }

    /// Refresh `domain`'s token, unless someone already replaced
    /// `stale_token` in the meantime.
    ///
    /// On failure the token is cleared so later requests do not keep
    /// presenting it.
    ///
    /// # Errors
    ///
    /// Returns the strategy's failure, or `NoStrategy` when the domain has
    /// no slot or no registered strategy.
    #[instrument(skip(self, stale_token), fields(domain = %domain))]
    pub async fn refresh(
        &self,
        domain: CredentialDomain,
        stale_token: Option<&str>,
    ) -> Result<(), RefreshFailure> {
        let slot = self.credentials.slot(domain).ok_or(RefreshFailure::NoStrategy(domain))?;
        let _gate = slot.refresh_gate().lock().await;

        let current = slot.token().await;
        if !current.is_empty() && Some(current.as_str()) != stale_token {
            debug!("token already refreshed by a concurrent request");
            return Ok(());
        }

        let Some(strategy) = self.strategy_for(domain) else {
            slot.clear_token().await;
            return Err(RefreshFailure::NoStrategy(domain));
        };

        match strategy.reauthenticate(self.transport.as_ref(), slot).await {
            Ok(token) => {
                slot.set_token(token).await;
                info!("credential refreshed");
                Ok(())
            }
            Err(failure) => {
                warn!(error = %failure, "credential refresh failed");
                slot.clear_token().await;
                Err(failure)
            }
        }
    }

    /// Refresh and replay `descriptor` until it gets a non-401 answer or
    /// the auth retry budget runs out.
    ///
    /// `stale_token` is the token the failed attempt carried. Every replay
    /// uses a new descriptor with the retry count incremented.
    #[instrument(
        skip_all,
        fields(path = %descriptor.path(), domain = %descriptor.credential_domain())
    )]
    pub async fn refresh_and_retry(
        &self,
        dispatcher: &Dispatcher,
        descriptor: RequestDescriptor,
        stale_token: Option<String>,
        max_auth_retries: u32,
    ) -> ResponseEnvelope {
        let domain = descriptor.credential_domain();
        let correlation_id = descriptor.correlation_id().map(str::to_owned);
        let mut descriptor = descriptor;
        let mut stale_token = stale_token;

        loop {
            if descriptor.retry_count() >= max_auth_retries {
                warn!(retries = descriptor.retry_count(), "authentication retry budget exhausted");
                return ResponseEnvelope::terminal(TerminalReason::CredentialExpired, correlation_id)
                    .with_auth_retries(descriptor.retry_count());
            }

            if let Err(failure) = self.refresh(domain, stale_token.as_deref()).await {
                return ResponseEnvelope::terminal(failure.terminal_reason(), correlation_id)
                    .with_auth_retries(descriptor.retry_count());
            }

            descriptor = descriptor.next_auth_attempt();
            let attempt = dispatcher.send_once(&descriptor).await;
            if !attempt.envelope.is_unauthorized() {
                return attempt.envelope.with_auth_retries(descriptor.retry_count());
            }

            debug!(retry = descriptor.retry_count(), "replay still unauthorized");
            stale_token = attempt.token;
        }
    }
}
