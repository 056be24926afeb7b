//! End-to-end behaviour of the dispatch pipeline against a scripted backend.

mod support;

use std::sync::Arc;
use std::time::Duration;

use gamelink_domain::{CredentialDomain, FailureKind, RequestDescriptor, ResponseEnvelope, TerminalReason};
use support::{respond, Harness, ScriptedTransport};

fn session_token(request: &gamelink_domain::ResolvedRequest) -> Option<&str> {
    request.header("x-session-token")
}

#[tokio::test]
async fn happy_path_makes_one_call_and_passes_body_through() {
    let transport = ScriptedTransport::always(200, r#"{"scores":[10,20]}"#);
    let harness = Harness::new(transport.clone());
    harness.login_player().await;

    let envelope = harness.dispatcher.dispatch(RequestDescriptor::get("/v1/leaderboards").build()).await;

    assert!(envelope.success);
    assert_eq!(envelope.status_code, 200);
    assert_eq!(envelope.raw_text, r#"{"scores":[10,20]}"#);
    assert!(envelope.error.is_none());
    assert_eq!(transport.api_calls(), 1);
    assert_eq!(session_token(&transport.api_requests()[0]), Some("session-1"));
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_replayed() {
    let transport = ScriptedTransport::new(|request, _| match session_token(request) {
        Some("session-1") => respond(401, r#"{"message":"session expired"}"#),
        _ => respond(200, r#"{"ok":true}"#),
    });
    let harness = Harness::new(transport.clone());
    harness.login_player().await;

    let envelope = harness.dispatcher.dispatch(RequestDescriptor::get("/v1/inventory").build()).await;

    assert!(envelope.success);
    assert_eq!(envelope.auth_retries, 1);
    assert_eq!(transport.api_calls(), 2);
    // login + one refresh
    assert_eq!(transport.sessions_minted(), 2);
    assert_eq!(session_token(&transport.api_requests()[1]), Some("session-2"));
    assert_eq!(harness.store.player().token().await, "session-2");
}

#[tokio::test]
async fn persistent_401_stops_after_four_refresh_cycles() {
    let transport = ScriptedTransport::always(401, r#"{"message":"nope"}"#);
    let harness = Harness::new(transport.clone());
    harness.login_player().await;

    let envelope = harness.dispatcher.dispatch(RequestDescriptor::get("/v1/inventory").build()).await;

    assert!(!envelope.success);
    assert_eq!(envelope.status_code, 401);
    assert_eq!(envelope.error_message(), Some("credential expired"));
    assert_eq!(envelope.terminal, Some(TerminalReason::CredentialExpired));
    assert_eq!(envelope.auth_retries, 4);
    assert_eq!(envelope.failure_kind(), Some(FailureKind::AuthenticationExpired));
    assert_eq!(transport.api_calls(), 5);
    assert_eq!(transport.sessions_minted(), 1 + 4);
}

#[tokio::test]
async fn custom_auth_retry_budget_is_honoured() {
    let transport = ScriptedTransport::always(401, "");
    let store = Arc::new(gamelink_core::CredentialStore::new(support::GAME_URL, support::ADMIN_URL));
    let dispatcher = gamelink_core::Dispatcher::builder()
        .transport(transport.clone())
        .credentials(store)
        .refresh_strategy(Arc::new(gamelink_core::PlayerSessionRefresh::new("k", "1", "desktop")))
        .max_auth_retries(1)
        .build()
        .unwrap();

    let envelope = dispatcher.dispatch(RequestDescriptor::get("/v1/x").build()).await;

    // no stored identifier: the first refresh already needs a user
    assert_eq!(envelope.terminal, Some(TerminalReason::InteractiveReauthRequired));
    assert_eq!(envelope.status_code, 401);
    assert_eq!(transport.api_calls(), 1);
    assert_eq!(transport.sessions_minted(), 0);
}

#[tokio::test]
async fn admin_second_factor_ends_silent_refresh() {
    let transport = ScriptedTransport::always(401, r#"{"message":"expired"}"#);
    transport.require_admin_mfa(true);
    let harness = Harness::new(transport.clone());

    harness.sessions.admin_login("ops@studio.test", "pw").await.unwrap();
    harness.sessions.verify_admin_second_factor("mfa-1", "123456").await.unwrap();
    assert_eq!(harness.store.admin().token().await, "admin-2fa");

    let envelope = harness
        .dispatcher
        .dispatch(RequestDescriptor::get("/v1/games").domain(CredentialDomain::Admin).build())
        .await;

    assert_eq!(envelope.status_code, 401);
    assert_eq!(envelope.error_message(), Some("credential expired"));
    assert_eq!(envelope.terminal, Some(TerminalReason::InteractiveReauthRequired));
    assert_eq!(transport.api_calls(), 1);
    // interactive login + one refresh attempt that hit the second factor
    assert_eq!(transport.admin_logins(), 2);
    assert!(!harness.store.admin().is_authenticated().await);
}

#[tokio::test]
async fn admin_refresh_without_second_factor_replays() {
    let transport = ScriptedTransport::new(|request, _| match request.header("x-auth-token") {
        Some("admin-1") => respond(401, ""),
        _ => respond(200, "[]"),
    });
    let harness = Harness::new(transport.clone());
    harness.sessions.admin_login("ops@studio.test", "pw").await.unwrap();

    let envelope = harness
        .dispatcher
        .dispatch(RequestDescriptor::get("/v1/games").domain(CredentialDomain::Admin).build())
        .await;

    assert!(envelope.success);
    assert_eq!(harness.store.admin().token().await, "admin-2");
    assert!(transport.api_requests().iter().all(|r| r.url.starts_with(support::ADMIN_URL)));
}

#[tokio::test]
async fn transport_faults_are_not_retried() {
    let transport = ScriptedTransport::new(|_, _| ResponseEnvelope::transport_fault("connection refused", None));
    let harness = Harness::new(transport.clone());
    harness.login_player().await;

    let envelope = harness.dispatcher.dispatch(RequestDescriptor::get("/v1/ping").build()).await;

    assert_eq!(envelope.status_code, 0);
    assert_eq!(envelope.failure_kind(), Some(FailureKind::Transport));
    assert_eq!(envelope.error_message(), Some("connection refused"));
    assert_eq!(transport.api_calls(), 1);
}

#[tokio::test]
async fn same_descriptor_dispatched_twice_gives_identical_envelopes() {
    let transport = ScriptedTransport::always(200, r#"{"motd":"hello"}"#);
    let harness = Harness::new(transport.clone());
    harness.login_player().await;
    let descriptor = RequestDescriptor::get("/v1/motd").build();

    let first = harness.dispatcher.dispatch(descriptor.clone()).await;
    let second = harness.dispatcher.dispatch(descriptor).await;

    assert_eq!(first, second);
    assert_eq!(transport.api_calls(), 2);
    assert_eq!(transport.sessions_minted(), 1);
    assert_eq!(harness.store.player().token().await, "session-1");
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let transport = ScriptedTransport::new(|request, _| match session_token(request) {
        Some("session-1") => respond(401, ""),
        _ => respond(200, "{}"),
    });
    transport.set_session_latency(Duration::from_millis(20));
    let harness = Harness::new(transport.clone());
    harness.login_player().await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let dispatcher = harness.dispatcher.clone();
            tokio::spawn(async move {
                dispatcher.dispatch(RequestDescriptor::get("/v1/item/{0}").path_arg(i).build()).await
            })
        })
        .collect();
    let envelopes = futures::future::join_all(handles).await;

    for envelope in envelopes {
        assert!(envelope.unwrap().success);
    }
    assert_eq!(transport.sessions_minted(), 2);
    assert_eq!(harness.store.player().token().await, "session-2");
}

#[tokio::test]
async fn dropped_caller_does_not_cancel_refresh() {
    let transport = ScriptedTransport::new(|request, _| match session_token(request) {
        Some("session-1") => respond(401, ""),
        _ => respond(200, "{}"),
    });
    let harness = Harness::new(transport.clone());
    harness.login_player().await;
    transport.set_session_latency(Duration::from_millis(50));

    let dispatch = harness.dispatcher.dispatch(RequestDescriptor::get("/v1/ping").build());
    let timed_out = tokio::time::timeout(Duration::from_millis(5), dispatch).await;
    assert!(timed_out.is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(harness.store.player().token().await, "session-2");
    assert_eq!(transport.api_calls(), 2);
}

#[tokio::test]
async fn unauthenticated_requests_carry_no_token() {
    let transport = ScriptedTransport::always(200, "{}");
    let harness = Harness::new(transport.clone());
    harness.login_player().await;

    harness.dispatcher.dispatch(RequestDescriptor::get("/v1/status").unauthenticated().build()).await;

    let request = &transport.api_requests()[0];
    assert_eq!(request.url, "https://game.test/v1/status");
    assert!(session_token(request).is_none());
}
