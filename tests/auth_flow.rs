//! Sign-in flow and credential headers.

mod support;

use post_ai_client::{Error, MemoryTokenStore, PostAiClient, StaticCsrf, TokenStore};
use serde_json::json;
use std::sync::Arc;
use support::MockBackend;

#[tokio::test]
async fn login_stores_token_for_later_requests() {
    let mut backend = MockBackend::new().await;
    let login = backend
        .server
        .mock("POST", "/auth/login")
        .match_body(mockito::Matcher::Json(
            json!({"handle_or_email": "ana", "password": "hunter2"}),
        ))
        .with_status(200)
        .with_body(r#"{"access_token":"fresh-jwt","token_type":"bearer"}"#)
        .expect(1)
        .create_async()
        .await;
    let me = backend
        .server
        .mock("GET", "/auth/me")
        .match_header("authorization", "Bearer fresh-jwt")
        .with_status(200)
        .with_body(r#"{"handle":"ana","display_name":"Ana"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = PostAiClient::builder()
        .config(backend.config())
        .token_store(store.clone())
        .notifier(backend.notices.clone())
        .build()
        .unwrap();
    let auth = client.auth();
    assert!(!auth.is_signed_in());

    auth.login("ana", "hunter2").await.unwrap();
    assert_eq!(store.get().as_deref(), Some("fresh-jwt"));
    assert!(auth.is_signed_in());

    let account = auth.me().await.unwrap();
    assert_eq!(account.label(), "Ana");

    auth.logout().unwrap();
    assert!(!auth.is_signed_in());
    login.assert_async().await;
    me.assert_async().await;
}

#[tokio::test]
async fn bad_credentials_are_a_backend_error() {
    let mut backend = MockBackend::new().await;
    let _mock1 = backend
        .json("POST", "/auth/login", 401, r#"{"detail":"Invalid credentials"}"#, 1)
        .await;

    let client = backend.anonymous_client();
    let result = client.auth().login("ana", "wrong").await;
    assert!(matches!(result, Err(Error::BackendError { status: 401, .. })));
    assert!(!client.auth().is_signed_in());
}

#[tokio::test]
async fn rejected_token_is_an_expired_session() {
    let mut backend = MockBackend::new().await;
    let _mock2 = backend
        .json("GET", "/auth/me", 401, r#"{"detail":"Not authenticated"}"#, 1)
        .await;

    let client = backend.client();
    assert!(matches!(client.auth().me().await, Err(Error::SessionExpired)));
}

#[tokio::test]
async fn empty_confirmation_body_is_accepted() {
    let mut backend = MockBackend::new().await;
    let _mock3 = backend
        .json("POST", "/auth/confirm-email", 200, "", 1)
        .await;

    let client = backend.client();
    assert_eq!(client.auth().confirm_email("tok").await.unwrap(), json!({}));
}

#[tokio::test]
async fn csrf_header_is_sent_when_available() {
    let mut backend = MockBackend::new().await;
    let submit = backend
        .server
        .mock("POST", "/api/posts/3/translate")
        .match_header("authorization", "Bearer test-token")
        .match_header("x-csrf-token", "c5rf")
        .with_status(200)
        .with_body(r#"{"translated_text":"ok"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = PostAiClient::builder()
        .config(backend.config())
        .token_store(Arc::new(MemoryTokenStore::with_token(support::TOKEN)))
        .csrf(Arc::new(StaticCsrf::from_cookie_header("theme=dark; csrf_token=c5rf")))
        .notifier(backend.notices.clone())
        .build()
        .unwrap();

    assert!(client.translate_post("3").await.is_some());
    submit.assert_async().await;
}
