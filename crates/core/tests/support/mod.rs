//! Shared test helpers for `gamelink-core` integration tests.
//!
//! A scripted in-memory backend stands in for the network so pipeline tests
//! can count exactly which calls were made.

#![allow(dead_code)]

pub mod transport;

use std::sync::Arc;

use gamelink_core::{
    AdminLoginRefresh, CredentialStore, Dispatcher, PlayerSessionRefresh, RateLimitRetryQueue,
    SessionService,
};
pub use transport::{respond, ScriptedTransport};

pub const GAME_URL: &str = "https://game.test";
pub const ADMIN_URL: &str = "https://admin.test";

/// Dispatcher wired to `transport` with both silent refresh strategies.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub sessions: SessionService,
    pub store: Arc<CredentialStore>,
    pub transport: Arc<ScriptedTransport>,
}

impl Harness {
    pub fn new(transport: Arc<ScriptedTransport>) -> Self {
        Self::with_rate_limit(transport, RateLimitRetryQueue::default())
    }

    pub fn with_rate_limit(transport: Arc<ScriptedTransport>, queue: RateLimitRetryQueue) -> Self {
        let store = Arc::new(CredentialStore::new(GAME_URL, ADMIN_URL));
        let player = PlayerSessionRefresh::new("dev_key", "1.0.0", "desktop");

        let dispatcher = Dispatcher::builder()
            .transport(transport.clone())
            .credentials(Arc::clone(&store))
            .refresh_strategy(Arc::new(player.clone()))
            .refresh_strategy(Arc::new(AdminLoginRefresh::new()))
            .rate_limit(queue)
            .build()
            .expect("dispatcher should build");

        let sessions = SessionService::new(transport.clone(), Arc::clone(&store), player);

        Self { dispatcher, sessions, store, transport }
    }

    /// Start a player session; the backend issues `session-1`.
    pub async fn login_player(&self) {
        self.sessions.start_player_session("device-1").await.expect("player login should succeed");
    }
}
