//! Integration tests for the session store.

mod common;

use client_lib::adapters::MemoryStore;
use common::{app, respond, signed_in_storage, user_json, FakeTransport};
use marketplace_core::ports::{KeyValueStore, Method, PortError};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn fetch_user_without_token_makes_no_calls() {
    let transport = Arc::new(FakeTransport::new(|_| respond(200, user_json("u1", false))));
    let state = app(transport.clone(), Arc::new(MemoryStore::new()));

    let session = state.session.fetch_user().await;

    assert!(session.user.is_none());
    assert!(!session.is_authenticated);
    assert_eq!(transport.total(), 0);
}

#[tokio::test]
async fn fetch_user_picks_up_stored_token() {
    let transport = Arc::new(FakeTransport::new(|req| {
        assert_eq!(req.bearer.as_deref(), Some("stored-access"));
        respond(200, user_json("u1", true))
    }));
    let storage = signed_in_storage("stored-access", "stored-refresh");
    let state = app(transport.clone(), storage.clone());

    let session = state.session.fetch_user().await;

    assert!(session.is_authenticated);
    assert_eq!(session.user.as_ref().map(|u| u.id.as_str()), Some("u1"));
    assert!(session.is_admin());
    assert_eq!(transport.count(Method::Get, "/auth/me"), 1);
    // The profile is cached in the session blob.
    assert!(storage.get("auth-storage").await.unwrap().is_some());
}

#[tokio::test]
async fn failed_profile_fetch_clears_everything() {
    let transport = Arc::new(FakeTransport::new(|_| {
        respond(403, json!({ "message": "forbidden" }))
    }));
    let storage = signed_in_storage("bad-access", "bad-refresh");
    let state = app(transport, storage.clone());

    let session = state.session.fetch_user().await;

    assert!(!session.is_authenticated);
    assert!(session.access_token.is_none());
    assert!(session.refresh_token.is_none());
    assert_eq!(storage.get("accessToken").await.unwrap(), None);
    assert_eq!(storage.get("refreshToken").await.unwrap(), None);
}

#[tokio::test]
async fn network_failure_during_fetch_logs_out() {
    let transport = Arc::new(FakeTransport::new(|_| {
        Err(PortError::Network("connection refused".into()))
    }));
    let state = app(transport, signed_in_storage("a", "r"));

    let session = state.session.fetch_user().await;

    assert!(!session.is_authenticated);
    assert!(session.access_token.is_none());
}

#[tokio::test]
async fn logout_clears_local_state_even_when_server_fails() {
    let transport = Arc::new(FakeTransport::new(|req| match req.path.as_str() {
        "/auth/me" => respond(200, user_json("u1", false)),
        _ => respond(500, json!({ "message": "down" })),
    }));
    let storage = signed_in_storage("access", "refresh");
    let state = app(transport.clone(), storage.clone());
    assert!(state.session.fetch_user().await.is_authenticated);

    state.session.logout().await;

    let session = state.session.snapshot().await;
    assert!(session.user.is_none());
    assert!(!session.is_authenticated);
    assert!(session.access_token.is_none());
    assert_eq!(transport.count(Method::Post, "/auth/logout"), 1);
    for key in ["accessToken", "refreshToken", "auth-storage"] {
        assert_eq!(storage.get(key).await.unwrap(), None, "{} left behind", key);
    }
}

#[tokio::test]
async fn set_tokens_persists_and_marks_authenticated() {
    let transport = Arc::new(FakeTransport::new(|_| respond(200, json!({}))));
    let storage = Arc::new(MemoryStore::new());
    let state = app(transport.clone(), storage.clone());

    state.session.set_tokens("a1", "r1").await.unwrap();

    let session = state.session.snapshot().await;
    assert!(session.is_authenticated);
    assert_eq!(storage.get("accessToken").await.unwrap().as_deref(), Some("a1"));
    assert_eq!(storage.get("refreshToken").await.unwrap().as_deref(), Some("r1"));
    assert_eq!(transport.total(), 0);
}

#[tokio::test]
async fn update_access_token_leaves_refresh_token_and_user() {
    let transport = Arc::new(FakeTransport::new(|_| respond(200, user_json("u1", false))));
    let storage = signed_in_storage("a1", "r1");
    let state = app(transport, storage.clone());
    state.session.fetch_user().await;

    state.session.update_access_token("a2").await;

    let session = state.session.snapshot().await;
    assert_eq!(session.access_token.as_deref(), Some("a2"));
    assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    assert!(session.user.is_some());
    assert_eq!(storage.get("accessToken").await.unwrap().as_deref(), Some("a2"));
}

#[tokio::test]
async fn complete_login_loads_the_profile() {
    let transport = Arc::new(FakeTransport::new(|req| {
        assert_eq!(req.bearer.as_deref(), Some("fresh"));
        respond(200, user_json("u9", false))
    }));
    let state = app(transport, Arc::new(MemoryStore::new()));

    let session = state.session.complete_login("fresh", "long").await.unwrap();

    assert_eq!(session.user.map(|u| u.id), Some("u9".to_string()));
}

#[tokio::test]
async fn restore_trusts_cached_profile_only_with_a_token() {
    let blob = json!({ "user": user_json("u1", false), "isAuthenticated": true }).to_string();
    let transport = Arc::new(FakeTransport::new(|_| respond(200, json!({}))));

    let with_token = Arc::new(MemoryStore::with_entries([
        ("accessToken", "a"),
        ("refreshToken", "r"),
        ("auth-storage", blob.as_str()),
    ]));
    let session = app(transport.clone(), with_token).session.restore().await;
    assert!(session.is_authenticated);

    let without_token = Arc::new(MemoryStore::with_entries([("auth-storage", blob.as_str())]));
    let session = app(transport.clone(), without_token).session.restore().await;
    assert!(!session.is_authenticated);
    assert!(session.user.is_none());
    assert_eq!(transport.total(), 0);
}
