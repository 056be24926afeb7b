//! Per-domain credential state
//!
//! One [`CredentialSlot`] per credential domain holds the bearer token, the
//! header that carries it, the base URL requests are resolved against, and
//! the material a silent refresh needs. Slots are owned by a
//! [`CredentialStore`] that is passed explicitly to the dispatcher and the
//! refresh coordinator.
//!
//! Token writes are crate-private: only the refresh coordinator and the
//! login flows in [`crate::auth::SessionService`] can change a token.

use chrono::{DateTime, Utc};
use gamelink_domain::constants::{ADMIN_AUTH_HEADER, PLAYER_AUTH_HEADER};
use gamelink_domain::{AdminCredentials, CredentialDomain, PlayerCredentials};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
struct SlotState {
    token: String,
    base_url: String,
    authenticated_at: Option<DateTime<Utc>>,
    player: Option<PlayerCredentials>,
    admin: Option<AdminCredentials>,
}

/// Consistent view of the parts of a slot a single request needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub token: String,
    pub base_url: String,
}

/// Credential state of one domain.
#[derive(Debug)]
pub struct CredentialSlot {
    domain: CredentialDomain,
    auth_header_name: String,
    default_headers: Vec<(String, String)>,
    state: RwLock<SlotState>,
    refresh_gate: Mutex<()>,
}

impl CredentialSlot {
    /// Create an unauthenticated slot.
    pub fn new(
        domain: CredentialDomain,
        auth_header_name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            auth_header_name: auth_header_name.into(),
            default_headers: Vec::new(),
            state: RwLock::new(SlotState { base_url: base_url.into(), ..SlotState::default() }),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Header sent on every request of this domain, below descriptor headers.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn domain(&self) -> CredentialDomain {
        self.domain
    }

    pub fn auth_header_name(&self) -> &str {
        &self.auth_header_name
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    /// Current token; empty when not authenticated.
    pub async fn token(&self) -> String {
        self.state.read().await.token.clone()
    }

    pub async fn base_url(&self) -> String {
        self.state.read().await.base_url.clone()
    }

    /// Token and base URL read under one lock.
    pub async fn snapshot(&self) -> SlotSnapshot {
        let state = self.state.read().await;
        SlotSnapshot { token: state.token.clone(), base_url: state.base_url.clone() }
    }

    pub async fn is_authenticated(&self) -> bool {
        !self.state.read().await.token.is_empty()
    }

    /// When the current token was written.
    pub async fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.authenticated_at
    }

    /// Point this domain at another API root.
    pub async fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        debug!(domain = %self.domain, base_url = %base_url, "credential slot base url changed");
        self.state.write().await.base_url = base_url;
    }

    pub async fn player_credentials(&self) -> Option<PlayerCredentials> {
        self.state.read().await.player.clone()
    }

    pub async fn admin_credentials(&self) -> Option<AdminCredentials> {
        self.state.read().await.admin.clone()
    }

    pub(crate) async fn set_token(&self, token: String) {
        let mut state = self.state.write().await;
        state.token = token;
        state.authenticated_at = Some(Utc::now());
    }

    pub(crate) async fn clear_token(&self) {
        let mut state = self.state.write().await;
        state.token.clear();
        state.authenticated_at = None;
    }

    pub(crate) async fn store_player_credentials(&self, credentials: PlayerCredentials) {
        self.state.write().await.player = Some(credentials);
    }

    pub(crate) async fn store_admin_credentials(&self, credentials: AdminCredentials) {
        self.state.write().await.admin = Some(credentials);
    }

    /// Forget token and refresh material.
    pub(crate) async fn clear(&self) {
        let mut state = self.state.write().await;
        state.token.clear();
        state.authenticated_at = None;
        state.player = None;
        state.admin = None;
    }

    /// Serializes refreshes of this domain.
    pub(crate) fn refresh_gate(&self) -> &Mutex<()> {
        &self.refresh_gate
    }
}

/// The player and admin slots.
#[derive(Debug)]
pub struct CredentialStore {
    player: CredentialSlot,
    admin: CredentialSlot,
}

impl CredentialStore {
    /// Store with the standard auth header names.
    pub fn new(game_url: impl Into<String>, admin_url: impl Into<String>) -> Self {
        Self {
            player: CredentialSlot::new(CredentialDomain::Player, PLAYER_AUTH_HEADER, game_url),
            admin: CredentialSlot::new(CredentialDomain::Admin, ADMIN_AUTH_HEADER, admin_url),
        }
    }

    /// Store from pre-configured slots (custom headers or defaults).
    pub fn from_slots(player: CredentialSlot, admin: CredentialSlot) -> Self {
        Self { player, admin }
    }

    pub fn player(&self) -> &CredentialSlot {
        &self.player
    }

    pub fn admin(&self) -> &CredentialSlot {
        &self.admin
    }

    /// Slot for `domain`; `None` for unauthenticated requests.
    pub fn slot(&self, domain: CredentialDomain) -> Option<&CredentialSlot> {
        match domain {
            CredentialDomain::Player => Some(&self.player),
            CredentialDomain::Admin => Some(&self.admin),
            CredentialDomain::Unauthenticated => None,
        }
    }

    /// Root URL for `domain`. Unauthenticated calls go to the game-facing
    /// root.
    pub async fn base_url_for(&self, domain: CredentialDomain) -> String {
        match self.slot(domain) {
            Some(slot) => slot.base_url().await,
            None => self.player.base_url().await,
        }
    }
}
