mod support;

use std::collections::HashMap;
use support::MockBackend;

#[tokio::test]
async fn set_language_loads_active_and_fallback() {
    let mut backend = MockBackend::new().await;
    let fr = backend
        .json("GET", "/i18n/fr.json", 200, r#"{"greet":"Bonjour {name}"}"#, 1)
        .await;
    let en = backend
        .json(
            "GET",
            "/i18n/en.json",
            200,
            r#"{"greet":"Hello {name}","bye":"Goodbye"}"#,
            1,
        )
        .await;

    let client = backend.client();
    let tr = client.translator();
    tr.set_language("fr").await;

    let mut params = HashMap::new();
    params.insert("name", "Ana".to_string());
    assert_eq!(tr.language(), "fr");
    assert_eq!(tr.t_with("greet", &params), "Bonjour Ana");
    assert_eq!(tr.t("bye"), "Goodbye");
    assert_eq!(tr.t("nav.home"), "nav.home");
    fr.assert_async().await;
    en.assert_async().await;
}

#[tokio::test]
async fn missing_dictionary_falls_back_to_keys() {
    let mut backend = MockBackend::new().await;
    let _mock1 = backend.json("GET", "/i18n/xx.json", 404, "", 1).await;
    let _mock2 = backend
        .json("GET", "/i18n/en.json", 200, r#"{"bye":"Goodbye"}"#, 1)
        .await;

    let client = backend.client();
    client.translator().set_language("xx").await;
    assert_eq!(client.translator().t("bye"), "Goodbye");
    assert_eq!(client.translator().t("greet"), "greet");
}

#[tokio::test]
async fn notices_follow_the_active_language() {
    let mut backend = MockBackend::new().await;
    let _de = backend
        .json(
            "GET",
            "/i18n/de.json",
            200,
            r#"{"toast.translated":"Beitrag übersetzt","toast.job_failed":"{action}: {detail}"}"#,
            1,
        )
        .await;
    let _en = backend.json("GET", "/i18n/en.json", 200, "{}", 1).await;
    let _submit = backend
        .json("POST", "/api/posts/1/translate", 200, r#"{"translated_text":"Hallo"}"#, 1)
        .await;

    let client = backend.client();
    client.translator().set_language("de").await;
    assert!(client.translate_post("1").await.is_some());

    let notices = backend.notices.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Beitrag übersetzt");
    assert_eq!(notices[0].key.as_deref(), Some("toast.translated"));
}
