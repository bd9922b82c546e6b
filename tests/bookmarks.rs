//! Bookmark toggling and lookup sync.

mod support;

use mockito::Matcher;
use post_ai_client::bookmarks::ToggleFlag;
use post_ai_client::{BookmarkKey, Error, NoticeLevel, ToggleOutcome};
use std::sync::Arc;
use support::MockBackend;

fn post(id: &str) -> BookmarkKey {
    BookmarkKey::new("post", id).unwrap()
}

#[tokio::test]
async fn toggle_adds_then_removes() {
    let mut backend = MockBackend::new().await;
    let add = backend
        .server
        .mock("POST", "/bookmarks")
        .match_body(Matcher::Json(
            serde_json::json!({"target_type": "post", "target_id": "9"}),
        ))
        .with_status(201)
        .with_body(r#"{"id":41,"tags":["later"],"created_at":"2024-05-01T10:00:00Z"}"#)
        .expect(1)
        .create_async()
        .await;
    let remove = backend
        .server
        .mock("DELETE", "/bookmarks")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("target_type".into(), "post".into()),
            Matcher::UrlEncoded("target_id".into(), "9".into()),
        ]))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = backend.client();
    let bookmarks = client.bookmarks();
    let key = post("9");
    let flag = Arc::new(ToggleFlag::new());
    bookmarks.store().register(&key, flag.clone());
    assert!(!flag.is_active());

    match bookmarks.toggle(&key).await {
        Some(ToggleOutcome::Added(state)) => {
            assert_eq!(state.bookmark_id.as_deref(), Some("41"));
            assert_eq!(state.tags, vec!["later".to_string()]);
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(flag.is_active());
    assert_eq!(flag.bookmark_id().as_deref(), Some("41"));

    assert_eq!(bookmarks.toggle(&key).await, Some(ToggleOutcome::Removed));
    assert!(!flag.is_active());
    assert!(!bookmarks.store().is_busy(&key));

    let messages: Vec<String> = backend
        .notices
        .notices()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, vec!["Bookmarked", "Removed from bookmarks"]);
    add.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test]
async fn toggle_requires_sign_in() {
    let mut backend = MockBackend::new().await;
    let add = backend.json("POST", "/bookmarks", 201, "{}", 0).await;

    let client = backend.anonymous_client();
    assert!(client.bookmarks().toggle(&post("1")).await.is_none());
    assert_eq!(backend.notices.count_level(NoticeLevel::Warn), 1);
    add.assert_async().await;
}

#[tokio::test]
async fn expired_session_leaves_state_unchanged() {
    let mut backend = MockBackend::new().await;
    let _mock1 = backend.json("POST", "/bookmarks", 401, "", 1).await;

    let client = backend.client();
    let bookmarks = client.bookmarks();
    let key = post("1");
    assert!(matches!(
        bookmarks.try_toggle(&key).await,
        Err(Error::SessionExpired)
    ));
    assert!(!bookmarks.store().is_bookmarked(&key));
    assert!(!bookmarks.store().is_busy(&key));
}

#[tokio::test]
async fn sync_applies_lookup_and_clears_missing_keys() {
    let mut backend = MockBackend::new().await;
    let lookup = backend
        .server
        .mock("GET", "/bookmarks/lookup")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("target_type".into(), "post".into()),
            Matcher::UrlEncoded("target_ids".into(), "1,2".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"items":[{"target_id":1,"bookmark_id":"b1","tags":[]}]}"#)
        .expect(1)
        .create_async()
        .await;

    let client = backend.client();
    let bookmarks = client.bookmarks();
    let (one, two) = (post("1"), post("2"));
    let flag_one = Arc::new(ToggleFlag::new());
    let flag_two = Arc::new(ToggleFlag::new());
    bookmarks.store().register(&one, flag_one.clone());
    bookmarks.store().register(&two, flag_two.clone());
    bookmarks
        .store()
        .set(&two, post_ai_client::BookmarkState::default());
    assert!(flag_two.is_active());

    bookmarks.sync_registered().await;

    assert!(flag_one.is_active());
    assert_eq!(flag_one.bookmark_id().as_deref(), Some("b1"));
    assert!(!flag_two.is_active());
    lookup.assert_async().await;
}

#[tokio::test]
async fn signed_out_sync_clears_without_requests() {
    let mut backend = MockBackend::new().await;
    let lookup = backend
        .server
        .mock("GET", "/bookmarks/lookup")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = backend.anonymous_client();
    let bookmarks = client.bookmarks();
    let key = post("5");
    bookmarks
        .store()
        .set(&key, post_ai_client::BookmarkState::default());

    bookmarks.sync(&[key.clone()]).await;
    assert!(!bookmarks.store().is_bookmarked(&key));
    lookup.assert_async().await;
}
