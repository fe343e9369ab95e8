//! Integration tests for the vtsite HTTP surface.
//!
//! Uses axum-test to drive the router without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await - tests that touch env vars are
// serialized intentionally
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use vtsite::api::{AppState, HealthResponse, create_router};
use vtsite::mail::MemoryMailer;
use vtsite::oembed::OembedClient;
use vtsite_core::primitives::AUTOFILL_FAILURE_SENTINEL;
use vtsite_core::{ContactForm, NonceKey, Settings};

/// Mutex to serialize tests since the admin key is read from the environment.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

const API_KEY: &str = "test-admin-key-12345";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard that holds the mutex and clears the admin key on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("VTSITE_API_KEY") };
    }
}

struct Harness {
    server: TestServer,
    state: AppState,
    mailer: Arc<MemoryMailer>,
    _guard: TestGuard,
}

fn build(api_key: Option<&str>, mailer: MemoryMailer) -> Harness {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe {
        match api_key {
            Some(key) => std::env::set_var("VTSITE_API_KEY", key),
            None => std::env::remove_var("VTSITE_API_KEY"),
        }
    }

    let mailer = Arc::new(mailer);
    // Nothing listens on port 9, so every oEmbed lookup fails fast.
    let oembed = OembedClient::new("http://127.0.0.1:9/oembed", 2).unwrap();
    let state = AppState::new(
        Settings::in_memory(),
        NonceKey::from_secret(b"test nonce secret"),
        mailer.clone(),
        oembed,
    );
    let server = TestServer::new(create_router(state.clone())).unwrap();
    Harness {
        server,
        state,
        mailer,
        _guard: TestGuard { _guard: guard },
    }
}

fn public_server() -> Harness {
    build(None, MemoryMailer::new())
}

fn admin_server() -> Harness {
    build(Some(API_KEY), MemoryMailer::new())
}

fn bearer() -> HeaderValue {
    format!("Bearer {}", API_KEY).parse::<HeaderValue>().unwrap()
}

/// Pull the contact token out of a rendered page.
fn contact_token(html: &str) -> String {
    let marker = "name=\"contact_nonce\" value=\"";
    let start = html.find(marker).expect("contact form present") + marker.len();
    let len = html[start..].find('"').unwrap();
    html[start..start + len].to_string()
}

fn form(token: &str) -> ContactForm {
    ContactForm {
        contact_name: "Aki".to_string(),
        contact_email: "aki@example.com".to_string(),
        contact_subject: "Collab".to_string(),
        contact_message: "Would you like to sing a duet?".to_string(),
        token: token.to_string(),
        redirect_to: "/".to_string(),
    }
}

async fn set_recipient(state: &AppState) {
    state
        .settings
        .write()
        .await
        .set("contact_recipient", "rin@example.com")
        .unwrap();
}

// =============================================================================
// HEALTH AND PAGES
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let h = public_server();
    let response = h.server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_home_page_renders_defaults_and_fallbacks() {
    let h = public_server();
    let response = h.server.get("/").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("data-theme=\"light\""));
    assert!(html.contains("Hoshimiya Rin"));
    assert!(html.contains("2023.06"));
    assert!(html.contains("application/ld+json"));
    assert!(!contact_token(&html).is_empty());
}

#[tokio::test]
async fn test_achievements_page_groups_by_year() {
    let h = public_server();
    h.state
        .settings
        .write()
        .await
        .set(
            "achievements_personal",
            r#"[{"icon":"🎤","date":"2024.01","title":"First live","description":""},
                {"icon":"🎮","date":"2023.12","title":"Game marathon","description":""}]"#,
        )
        .unwrap();

    let response = h.server.get("/achievements").await;
    response.assert_status_ok();
    let html = response.text();
    let newer = html.find("First live").unwrap();
    let older = html.find("Game marathon").unwrap();
    assert!(newer < older);
    assert!(!html.contains("2023.06"));
}

#[tokio::test]
async fn test_unknown_path_is_404_page() {
    let h = public_server();
    let response = h.server.get("/no-such-page").await;

    response.assert_status_not_found();
    let html = response.text();
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("/no-such-page"));
}

#[tokio::test]
async fn test_theme_cookie_and_client_hint() {
    let h = public_server();

    let dark = h
        .server
        .get("/")
        .add_header(header::COOKIE, HeaderValue::from_static("vtsite_theme=dark"))
        .await;
    assert!(dark.text().contains("data-theme=\"dark\""));

    let hinted = h
        .server
        .get("/")
        .add_header(
            "sec-ch-prefers-color-scheme".parse::<header::HeaderName>().unwrap(),
            HeaderValue::from_static("\"dark\""),
        )
        .await;
    assert!(hinted.text().contains("data-theme=\"dark\""));
}

#[tokio::test]
async fn test_theme_toggle_sets_cookie_and_redirects() {
    let h = public_server();
    let response = h
        .server
        .post("/theme")
        .add_header(header::COOKIE, HeaderValue::from_static("vtsite_theme=dark"))
        .form(&json!({ "redirect_to": "/achievements" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION), "/achievements");
    let cookie = response.header(header::SET_COOKIE);
    assert!(cookie.to_str().unwrap().starts_with("vtsite_theme=light;"));
}

#[tokio::test]
async fn test_theme_toggle_refuses_offsite_redirect() {
    let h = public_server();
    let response = h
        .server
        .post("/theme")
        .form(&json!({ "redirect_to": "https://evil.example/" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION), "/");
}

#[tokio::test]
async fn test_menu_query_opens_sidebar() {
    let h = public_server();
    let html = h.server.get("/?menu=open").await.text();
    assert!(html.contains("data-state=\"open\""));

    let html = h.server.get("/").await.text();
    assert!(html.contains("data-state=\"closed\""));
}

#[tokio::test]
async fn test_contact_banner_from_query() {
    let h = public_server();
    let html = h.server.get("/?contact=success").await.text();
    assert!(html.contains("contact-status--success"));
}

// =============================================================================
// CONTACT FORM
// =============================================================================

#[tokio::test]
async fn test_contact_success_sends_one_mail() {
    let h = public_server();
    set_recipient(&h.state).await;
    let token = contact_token(&h.server.get("/").await.text());

    let response = h.server.post("/contact").form(&form(&token)).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.header(header::LOCATION),
        "/?contact=success#contact"
    );
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "rin@example.com");
    assert_eq!(sent[0].reply_to, "Aki <aki@example.com>");
    assert!(sent[0].body.contains("sing a duet"));
}

#[tokio::test]
async fn test_contact_empty_email_is_error_and_sends_nothing() {
    let h = public_server();
    set_recipient(&h.state).await;
    let token = contact_token(&h.server.get("/").await.text());

    let mut submission = form(&token);
    submission.contact_email = String::new();
    let response = h.server.post("/contact").form(&submission).await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION), "/?contact=error#contact");
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_contact_bad_token_is_error() {
    let h = public_server();
    set_recipient(&h.state).await;

    let response = h.server.post("/contact").form(&form("forged-token")).await;

    assert_eq!(response.header(header::LOCATION), "/?contact=error#contact");
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_contact_without_recipient_is_error() {
    let h = public_server();
    let token = contact_token(&h.server.get("/").await.text());

    let response = h.server.post("/contact").form(&form(&token)).await;

    assert_eq!(response.header(header::LOCATION), "/?contact=error#contact");
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_contact_disabled_is_error() {
    let h = public_server();
    set_recipient(&h.state).await;
    let token = contact_token(&h.server.get("/").await.text());
    h.state
        .settings
        .write()
        .await
        .set("contact_enabled", "0")
        .unwrap();

    let response = h.server.post("/contact").form(&form(&token)).await;

    assert_eq!(response.header(header::LOCATION), "/?contact=error#contact");
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_contact_delivery_failure_is_error() {
    let h = build(None, MemoryMailer::failing());
    set_recipient(&h.state).await;
    let token = contact_token(&h.server.get("/").await.text());

    let response = h.server.post("/contact").form(&form(&token)).await;

    assert_eq!(response.header(header::LOCATION), "/?contact=error#contact");
}

#[tokio::test]
async fn test_contact_returns_to_same_site_page_only() {
    let h = public_server();
    set_recipient(&h.state).await;
    let token = contact_token(&h.server.get("/").await.text());

    let mut submission = form(&token);
    submission.redirect_to = "/achievements?contact=error".to_string();
    let response = h.server.post("/contact").form(&submission).await;
    assert_eq!(
        response.header(header::LOCATION),
        "/achievements?contact=success#contact"
    );

    let mut submission = form(&token);
    submission.redirect_to = "//evil.example/".to_string();
    let response = h.server.post("/contact").form(&submission).await;
    assert_eq!(
        response.header(header::LOCATION),
        "/?contact=success#contact"
    );
}

// =============================================================================
// ADMIN AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_admin_disabled_without_key() {
    let h = public_server();
    let response = h.server.get("/admin/schema").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_admin_requires_bearer_key() {
    let h = admin_server();

    let missing = h.server.get("/admin/schema").await;
    assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);

    let wrong = h
        .server
        .get("/admin/schema")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

    let ok = h
        .server
        .get("/admin/schema")
        .add_header(header::AUTHORIZATION, bearer())
        .await;
    ok.assert_status_ok();
    let body: Value = ok.json();
    let keys: Vec<&str> = body["settings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"achievements_personal"));
    assert!(keys.contains(&"featured_videos"));
}

#[tokio::test]
async fn test_public_pages_ignore_admin_key() {
    let h = admin_server();
    h.server.get("/").await.assert_status_ok();
    h.server.get("/health").await.assert_status_ok();
}

// =============================================================================
// ADMIN SETTINGS
// =============================================================================

#[tokio::test]
async fn test_admin_setting_is_sanitized_and_persisted() {
    let h = admin_server();
    let response = h
        .server
        .put("/admin/settings/tagline")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "value": "  <script>x</script>Singer   &amp; streamer " }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["value"], "xSinger &amp; streamer");
    assert_eq!(
        h.state.settings.read().await.text("tagline").unwrap(),
        "xSinger &amp; streamer"
    );
}

#[tokio::test]
async fn test_admin_bool_and_list_values() {
    let h = admin_server();

    let response = h
        .server
        .put("/admin/settings/loading_screen_enabled")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "value": false }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["value"], false);

    let response = h
        .server
        .put("/admin/settings/achievements_business")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "value": [
            { "icon": "🤝", "date": "2024.03", "title": "Brand collab", "description": "", "extra": 1 },
            "not a record"
        ] }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["dropped_fields"], 1);
    assert_eq!(body["dropped_records"], 1);
    assert_eq!(body["value"][0]["title"], "Brand collab");
}

#[tokio::test]
async fn test_admin_unknown_setting_is_404() {
    let h = admin_server();
    let response = h
        .server
        .put("/admin/settings/favourite_colour")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "value": "blue" }))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_admin_reset_restores_default() {
    let h = admin_server();
    h.server
        .put("/admin/settings/vtuber_name")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "value": "Someone Else" }))
        .await
        .assert_status_ok();

    let response = h
        .server
        .delete("/admin/settings/vtuber_name")
        .add_header(header::AUTHORIZATION, bearer())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["value"], "Hoshimiya Rin");
}

#[tokio::test]
async fn test_admin_settings_listing() {
    let h = admin_server();
    let response = h
        .server
        .get("/admin/settings")
        .add_header(header::AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["settings"]["contact_enabled"], true);
    assert_eq!(body["settings"]["featured_videos"].as_array().unwrap().len(), 3);
    assert!(body["orphaned"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let h = admin_server();
    let response = h
        .server
        .put("/admin/settings/about_text")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "value": "a".repeat(70 * 1024) }))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// ADMIN ACHIEVEMENTS
// =============================================================================

#[tokio::test]
async fn test_admin_achievements_editing_flow() {
    let h = admin_server();

    for _ in 0..2 {
        h.server
            .post("/admin/achievements/personal")
            .add_header(header::AUTHORIZATION, bearer())
            .await
            .assert_status_ok();
    }

    h.server
        .patch("/admin/achievements/personal/1")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "field": "title", "value": "<b>Debut</b> stream" }))
        .await
        .assert_status_ok();
    h.server
        .patch("/admin/achievements/personal/1")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "field": "date", "value": "2022.08" }))
        .await
        .assert_status_ok();

    let moved = h
        .server
        .post("/admin/achievements/personal/move")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "from": 1, "to": 0 }))
        .await;
    moved.assert_status_ok();
    let body: Value = moved.json();
    assert_eq!(body["records"][0]["title"], "Debut stream");
    assert_eq!(body["labels"], json!(["#1", "#2"]));

    let removed = h
        .server
        .delete("/admin/achievements/personal/1")
        .add_header(header::AUTHORIZATION, bearer())
        .await;
    removed.assert_status_ok();
    assert_eq!(removed.json::<Value>()["records"].as_array().unwrap().len(), 1);

    // Persisted immediately and visible on the page.
    let html = h.server.get("/achievements").await.text();
    assert!(html.contains("Debut stream"));
    assert!(html.contains("2022.08"));
}

#[tokio::test]
async fn test_admin_achievements_errors() {
    let h = admin_server();

    let unknown = h
        .server
        .get("/admin/achievements/music")
        .add_header(header::AUTHORIZATION, bearer())
        .await;
    unknown.assert_status_not_found();

    let out_of_range = h
        .server
        .delete("/admin/achievements/business/0")
        .add_header(header::AUTHORIZATION, bearer())
        .await;
    out_of_range.assert_status_bad_request();

    h.server
        .post("/admin/achievements/business")
        .add_header(header::AUTHORIZATION, bearer())
        .await
        .assert_status_ok();
    let wrong_icon = h
        .server
        .patch("/admin/achievements/business/0")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "field": "icon", "value": "🎤" }))
        .await;
    wrong_icon.assert_status_bad_request();

    let wrong_field = h
        .server
        .patch("/admin/achievements/business/0")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "field": "colour", "value": "red" }))
        .await;
    wrong_field.assert_status_bad_request();
}

#[tokio::test]
async fn test_admin_achievements_listing_has_icons() {
    let h = admin_server();
    let response = h
        .server
        .get("/admin/achievements/business")
        .add_header(header::AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["category"], "business");
    assert!(body["records"].as_array().unwrap().is_empty());
    let icons = body["icons"].as_array().unwrap();
    assert!(icons.iter().any(|i| i["icon"] == "🤝"));
}

// =============================================================================
// ADMIN VIDEOS
// =============================================================================

#[tokio::test]
async fn test_admin_video_slot_update() {
    let h = admin_server();
    let response = h
        .server
        .put("/admin/videos/1")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "url": "https://youtu.be/dQw4w9WgXcQ", "title": "Cover" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["videos"].as_array().unwrap().len(), 3);
    assert_eq!(body["videos"][1]["title"], "Cover");

    let html = h.server.get("/").await.text();
    assert!(html.contains("youtube-nocookie.com/embed/dQw4w9WgXcQ"));

    let bad_slot = h
        .server
        .put("/admin/videos/3")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "title": "x" }))
        .await;
    bad_slot.assert_status_bad_request();
}

#[tokio::test]
async fn test_admin_autofill_failure_writes_sentinel() {
    let h = admin_server();
    h.server
        .put("/admin/videos/0")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({ "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }))
        .await
        .assert_status_ok();

    let response = h
        .server
        .post("/admin/videos/0/autofill")
        .add_header(header::AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["autofill"], "failed");
    assert_eq!(body["videos"][0]["title"], AUTOFILL_FAILURE_SENTINEL);
    assert_eq!(
        body["videos"][0]["url"],
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    );
}

#[tokio::test]
async fn test_admin_autofill_needs_url() {
    let h = admin_server();
    let response = h
        .server
        .post("/admin/videos/2/autofill")
        .add_header(header::AUTHORIZATION, bearer())
        .await;
    response.assert_status_bad_request();
}
