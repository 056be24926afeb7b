//! Request dispatch pipeline
//!
//! [`Dispatcher::dispatch`] takes a [`RequestDescriptor`] and always comes
//! back with exactly one [`ResponseEnvelope`]:
//!
//! 1. The descriptor is resolved against its domain's slot (base URL,
//!    default headers, current token) and handed to the [`Transport`].
//! 2. A 401 on an authenticated domain goes to the [`RefreshCoordinator`],
//!    which refreshes the token and replays with an incremented retry
//!    count until the answer is not a 401 or the budget is spent.
//! 3. A failed response carrying `retry_after_seconds` is replayed by the
//!    [`RateLimitRetryQueue`] after the requested delay.
//!
//! Each dispatch runs on its own task, so dropping the caller's future does
//! not abandon a refresh that other requests may be waiting on.

pub mod ports;
pub mod rate_limit;
pub mod refresh;
pub mod url;

use std::sync::Arc;

use gamelink_domain::constants::MAX_AUTH_RETRIES;
use gamelink_domain::{
    CredentialDomain, GameLinkError, RequestDescriptor, ResolvedRequest, ResponseEnvelope,
    Result, TerminalReason,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

pub use ports::{RefreshStrategy, Transport};
pub use rate_limit::RateLimitRetryQueue;
pub use refresh::RefreshCoordinator;

use crate::credentials::CredentialStore;

/// One transport exchange and the token it was sent with.
pub(crate) struct Attempt {
    pub(crate) envelope: ResponseEnvelope,
    pub(crate) token: Option<String>,
}

struct DispatcherInner {
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialStore>,
    refresh: RefreshCoordinator,
    rate_limit: RateLimitRetryQueue,
    max_auth_retries: u32,
}

/// Entry point for every outgoing call. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.inner.credentials
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub fn max_auth_retries(&self) -> u32 {
        self.inner.max_auth_retries
    }

    /// Run `descriptor` through the pipeline and wait for its final
    /// envelope.
    pub async fn dispatch(&self, descriptor: RequestDescriptor) -> ResponseEnvelope {
        let correlation_id = descriptor.correlation_id().map(str::to_owned);
        let this = self.clone();

        match tokio::spawn(async move { this.run(descriptor).await }).await {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(error = %err, "dispatch task did not complete");
                ResponseEnvelope::terminal(TerminalReason::DispatchAborted, correlation_id)
            }
        }
    }

    /// Run `descriptor` in the background and hand the final envelope to
    /// `on_complete`, which is called exactly once.
    pub fn dispatch_detached<F>(&self, descriptor: RequestDescriptor, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(ResponseEnvelope) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            let envelope = this.dispatch(descriptor).await;
            on_complete(envelope);
        })
    }

    async fn run(&self, descriptor: RequestDescriptor) -> ResponseEnvelope {
        let mut descriptor = descriptor;

        loop {
            let envelope = self.send_authenticated(&descriptor).await;

            let Some(delay) = envelope.retry_after() else {
                return envelope.with_rate_limit_retries(descriptor.rate_limit_retries());
            };

            // Refresh cycles spent before the rate limit count against the replay.
            descriptor = descriptor.with_spent_auth_retries(envelope.auth_retries);

            match self.inner.rate_limit.schedule_retry(descriptor, delay).await {
                Ok(next) => descriptor = next,
                Err(terminal) => return terminal,
            }
        }
    }

    /// Send once and, on a 401, hand over to the refresh coordinator.
    async fn send_authenticated(&self, descriptor: &RequestDescriptor) -> ResponseEnvelope {
        let attempt = self.send_once(descriptor).await;

        if !attempt.envelope.is_unauthorized()
            || descriptor.credential_domain() == CredentialDomain::Unauthenticated
        {
            return attempt.envelope.with_auth_retries(descriptor.retry_count());
        }

        if descriptor.retry_count() >= self.inner.max_auth_retries {
            warn!(
                path = %descriptor.path(),
                retries = descriptor.retry_count(),
                "authentication retry budget exhausted"
            );
            return ResponseEnvelope::terminal(
                TerminalReason::CredentialExpired,
                descriptor.correlation_id().map(str::to_owned),
            )
            .with_auth_retries(descriptor.retry_count());
        }

        self.inner
            .refresh
            .refresh_and_retry(self, descriptor.clone(), attempt.token, self.inner.max_auth_retries)
            .await
    }

    /// Resolve `descriptor` against the current credential state and send
    /// it exactly once.
    #[instrument(
        skip(self, descriptor),
        fields(
            method = %descriptor.method(),
            path = %descriptor.path(),
            domain = %descriptor.credential_domain(),
            retry = descriptor.retry_count()
        )
    )]
    pub(crate) async fn send_once(&self, descriptor: &RequestDescriptor) -> Attempt {
        let domain = descriptor.credential_domain();
        let correlation_id = descriptor.correlation_id().map(str::to_owned);

        let (base_url, auth, defaults) = match self.inner.credentials.slot(domain) {
            Some(slot) => {
                let snapshot = slot.snapshot().await;
                let token = (!snapshot.token.is_empty()).then_some(snapshot.token);
                (snapshot.base_url, token.map(|t| (slot.auth_header_name(), t)), slot.default_headers())
            }
            None => (self.inner.credentials.base_url_for(domain).await, None, &[][..]),
        };

        let url = match url::resolve_url(&base_url, descriptor) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "request could not be resolved");
                let envelope = ResponseEnvelope::terminal(TerminalReason::InvalidRequest, correlation_id)
                    .with_error_message(err.to_string());
                let token = auth.map(|(_, token)| token);
                return Attempt { envelope, token };
            }
        };

        // Tokens only go to the domain's own origin.
        let auth = auth.filter(|_| {
            let same_origin = url::same_origin(&url, &base_url);
            if !same_origin {
                debug!("absolute URL outside the domain root, sending without credentials");
            }
            same_origin
        });
        let token = auth.as_ref().map(|(_, token)| token.clone());

        let headers = url::merge_headers(
            defaults,
            descriptor.headers(),
            auth.as_ref().map(|(name, token)| (*name, token.as_str())),
        );

        let request = ResolvedRequest {
            method: descriptor.method(),
            url,
            headers,
            body: descriptor.body().clone(),
            correlation_id: correlation_id.clone(),
        };

        let mut envelope = self.inner.transport.send(request).await;
        if envelope.correlation_id.is_none() {
            envelope.correlation_id = correlation_id;
        }
        debug!(status = envelope.status_code, success = envelope.success, "response received");

        Attempt { envelope, token }
    }
}

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<CredentialStore>>,
    strategies: Vec<Arc<dyn RefreshStrategy>>,
    rate_limit: Option<RateLimitRetryQueue>,
    max_auth_retries: Option<u32>,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Register the silent refresh for `strategy.domain()`.
    #[must_use]
    pub fn refresh_strategy(mut self, strategy: Arc<dyn RefreshStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, queue: RateLimitRetryQueue) -> Self {
        self.rate_limit = Some(queue);
        self
    }

    /// Refresh-and-replay cycles allowed per request (default 4).
    #[must_use]
    pub fn max_auth_retries(mut self, max: u32) -> Self {
        self.max_auth_retries = Some(max);
        self
    }

    /// # Errors
    ///
    /// Returns `GameLinkError::Config` when no transport or credential store
    /// was set.
    pub fn build(self) -> Result<Dispatcher> {
        let transport =
            self.transport.ok_or_else(|| GameLinkError::Config("transport not set".into()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| GameLinkError::Config("credential store not set".into()))?;

        let refresh = self.strategies.into_iter().fold(
            RefreshCoordinator::new(Arc::clone(&credentials), Arc::clone(&transport)),
            RefreshCoordinator::with_strategy,
        );

        Ok(Dispatcher {
            inner: Arc::new(DispatcherInner {
                transport,
                credentials,
                refresh,
                rate_limit: self.rate_limit.unwrap_or_default(),
                max_auth_retries: self.max_auth_retries.unwrap_or(MAX_AUTH_RETRIES),
            }),
        })
    }
}
