//! Scripted in-memory backend implementing the `Transport` port.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gamelink_core::Transport;
use gamelink_domain::constants::{ADMIN_LOGIN_PATH, ADMIN_TWO_FACTOR_PATH, PLAYER_SESSION_PATH};
use gamelink_domain::{ResolvedRequest, ResponseEnvelope};

type ApiResponder = dyn Fn(&ResolvedRequest, usize) -> ResponseEnvelope + Send + Sync;

/// Build a plain response envelope.
pub fn respond(status: u16, body: &str) -> ResponseEnvelope {
    ResponseEnvelope::from_http(status, Vec::new(), body, None)
}

/// Backend that answers the authentication endpoints itself and hands every
/// other request to a test-provided responder.
///
/// Player sessions are minted as `session-1`, `session-2`, ... and admin
/// logins as `admin-1`, `admin-2`, ... in call order.
pub struct ScriptedTransport {
    api: Box<ApiResponder>,
    requests: Mutex<Vec<ResolvedRequest>>,
    api_calls: AtomicUsize,
    sessions_minted: AtomicUsize,
    admin_logins: AtomicUsize,
    admin_requires_mfa: AtomicBool,
    session_latency: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    /// `api` receives each non-auth request and its zero-based index among
    /// them.
    pub fn new<F>(api: F) -> Arc<Self>
    where
        F: Fn(&ResolvedRequest, usize) -> ResponseEnvelope + Send + Sync + 'static,
    {
        Arc::new(Self {
            api: Box::new(api),
            requests: Mutex::new(Vec::new()),
            api_calls: AtomicUsize::new(0),
            sessions_minted: AtomicUsize::new(0),
            admin_logins: AtomicUsize::new(0),
            admin_requires_mfa: AtomicBool::new(false),
            session_latency: Mutex::new(None),
        })
    }

    /// Backend whose API answers every request with `status`/`body`.
    pub fn always(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |_, _| respond(status, body))
    }

    pub fn require_admin_mfa(&self, required: bool) {
        self.admin_requires_mfa.store(required, Ordering::SeqCst);
    }

    /// Delay player session responses.
    pub fn set_session_latency(&self, latency: Duration) {
        *self.session_latency.lock().unwrap() = Some(latency);
    }

    pub fn requests(&self) -> Vec<ResolvedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests that went to the API (not the auth endpoints).
    pub fn api_requests(&self) -> Vec<ResolvedRequest> {
        self.requests().into_iter().filter(|r| !is_auth_call(&r.url)).collect()
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    pub fn sessions_minted(&self) -> usize {
        self.sessions_minted.load(Ordering::SeqCst)
    }

    pub fn admin_logins(&self) -> usize {
        self.admin_logins.load(Ordering::SeqCst)
    }
}

fn is_auth_call(url: &str) -> bool {
    [PLAYER_SESSION_PATH, ADMIN_LOGIN_PATH, ADMIN_TWO_FACTOR_PATH].iter().any(|p| url.ends_with(p))
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ResolvedRequest) -> ResponseEnvelope {
        self.requests.lock().unwrap().push(request.clone());

        if request.url.ends_with(PLAYER_SESSION_PATH) {
            let latency = *self.session_latency.lock().unwrap();
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            let n = self.sessions_minted.fetch_add(1, Ordering::SeqCst) + 1;
            return respond(200, &format!(r#"{{"session_token":"session-{n}","player_id":1}}"#));
        }

        if request.url.ends_with(ADMIN_LOGIN_PATH) {
            let n = self.admin_logins.fetch_add(1, Ordering::SeqCst) + 1;
            if self.admin_requires_mfa.load(Ordering::SeqCst) {
                return respond(200, &format!(r#"{{"mfa_key":"mfa-{n}"}}"#));
            }
            return respond(200, &format!(r#"{{"auth_token":"admin-{n}"}}"#));
        }

        if request.url.ends_with(ADMIN_TWO_FACTOR_PATH) {
            return respond(200, r#"{"auth_token":"admin-2fa"}"#);
        }

        let index = self.api_calls.fetch_add(1, Ordering::SeqCst);
        (self.api)(&request, index)
    }
}
