//! GameLink client facade
//!
//! Wires the dispatcher, credential store, refresh strategies and the
//! reqwest transport from a single [`Config`].

use std::sync::Arc;
use std::time::Duration;

use gamelink_core::{
    AdminLoginRefresh, CredentialStore, Dispatcher, PlayerSessionRefresh, RateLimitRetryQueue,
    SessionService, Transport,
};
use gamelink_domain::{
    Config, CredentialDomain, Environment, RequestDescriptor, ResponseEnvelope, Result,
};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::http::ReqwestTransport;

/// Entry point for embedders.
pub struct GameLinkClient {
    config: Config,
    environment: RwLock<Environment>,
    dispatcher: Dispatcher,
    sessions: SessionService,
}

impl GameLinkClient {
    /// Create a client talking HTTP through reqwest.
    ///
    /// # Errors
    ///
    /// Returns `GameLinkError::Config` for an invalid configuration or when
    /// the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::from_config(&config.http)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client on top of any [`Transport`].
    ///
    /// # Errors
    ///
    /// Returns `GameLinkError::Config` for an invalid configuration.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let roots = config.active_roots();
        let store = Arc::new(CredentialStore::new(&roots.game_url, &roots.admin_url));
        let player =
            PlayerSessionRefresh::new(&config.game_key, &config.game_version, &config.platform);
        let queue = RateLimitRetryQueue::new(
            config.retry.max_rate_limit_retries,
            Duration::from_secs(config.retry.max_rate_limit_delay_secs),
        );

        let dispatcher = Dispatcher::builder()
            .transport(Arc::clone(&transport))
            .credentials(Arc::clone(&store))
            .refresh_strategy(Arc::new(player.clone()))
            .refresh_strategy(Arc::new(AdminLoginRefresh::new()))
            .rate_limit(queue)
            .max_auth_retries(config.retry.max_auth_retries)
            .build()?;
        let sessions = SessionService::new(transport, store, player);

        info!(environment = %config.environment, "gamelink client ready");

        Ok(Self { environment: RwLock::new(config.environment), config, dispatcher, sessions })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Login and logout flows.
    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// Run one call through the dispatch pipeline.
    pub async fn dispatch(&self, descriptor: RequestDescriptor) -> ResponseEnvelope {
        self.dispatcher.dispatch(descriptor).await
    }

    /// Dispatch and decode a successful JSON body.
    ///
    /// # Errors
    ///
    /// Returns `GameLinkError::Network` for failed envelopes (the message
    /// carries the status and server error) and
    /// `GameLinkError::Serialization` when the body does not decode.
    pub async fn request_json<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<T> {
        self.dispatch(descriptor).await.json()
    }

    /// Unauthenticated probe of `/health` on the game-facing root.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> bool {
        let envelope = self.dispatch(RequestDescriptor::get("/health").unauthenticated().build()).await;
        if !envelope.success {
            warn!(status = envelope.status_code, "health check failed");
        }
        envelope.success
    }

    pub async fn environment(&self) -> Environment {
        *self.environment.read().await
    }

    /// Point both domains at `environment`'s roots.
    ///
    /// Tokens and stored credentials are cleared: they are not valid across
    /// environments.
    #[instrument(skip(self), fields(environment = %environment))]
    pub async fn switch_environment(&self, environment: Environment) {
        let mut current = self.environment.write().await;
        let roots = self.config.endpoints.roots(environment);
        let store = self.dispatcher.credentials();

        store.player().set_base_url(&roots.game_url).await;
        store.admin().set_base_url(&roots.admin_url).await;
        self.sessions.logout(CredentialDomain::Player).await;
        self.sessions.logout(CredentialDomain::Admin).await;

        *current = environment;
        info!("environment switched");
    }
}
