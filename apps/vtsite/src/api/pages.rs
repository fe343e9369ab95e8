//! # Page Handlers
//!
//! Public HTML pages. Each request reads the settings once into a
//! `SiteConfig`, resolves the visitor's presentation state from headers and
//! query, and hands both to the renderer.

use super::types::{PageQuery, ThemeForm};
use super::{AppState, now_secs};
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, StatusCode, Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use vtsite_core::contact::local_path;
use vtsite_core::primitives::{CONTACT_NONCE_ACTION, THEME_COOKIE};
use vtsite_core::render::pages::MENU_TRIGGER_ID;
use vtsite_core::settings::LoadWarning;
use vtsite_core::{
    ContactStatus, PageContext, Sidebar, SiteConfig, ThemeMode, achievements_page, home_page,
    not_found_page,
};

/// Client hint carrying the OS colour scheme.
const PREFERS_COLOR_SCHEME: &str = "sec-ch-prefers-color-scheme";

/// One year, in seconds.
const THEME_COOKIE_MAX_AGE: u64 = 31_536_000;

#[derive(Debug, Clone, Copy)]
enum Page {
    Home,
    Achievements,
    NotFound,
}

// =============================================================================
// REQUEST STATE
// =============================================================================

/// Value of cookie `name`, if the request carries it.
fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Theme from the persisted cookie, else the OS hint, else light.
pub(crate) fn theme_from_headers(headers: &HeaderMap) -> ThemeMode {
    let prefers_dark = headers
        .get(PREFERS_COLOR_SCHEME)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| match v.trim().trim_matches('"') {
            "dark" => Some(true),
            "light" => Some(false),
            _ => None,
        });
    ThemeMode::resolve(cookie(headers, THEME_COOKIE), prefers_dark)
}

fn log_load_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        tracing::warn!(
            event = "settings_coerced",
            key = warning.key,
            dropped_fields = warning.dropped_fields,
            dropped_records = warning.dropped_records,
            malformed = warning.malformed,
            "Stored list decoded with losses"
        );
    }
}

async fn render(state: &AppState, headers: &HeaderMap, uri: &Uri, page: Page) -> Response {
    let loaded = {
        let settings = state.settings.read().await;
        SiteConfig::load(&settings)
    };
    let (config, warnings) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(event = "settings_unreadable", error = %e, "Cannot load settings");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Temporarily unavailable</h1>".to_string()),
            )
                .into_response();
        }
    };
    log_load_warnings(&warnings);

    let query = Query::<PageQuery>::try_from_uri(uri)
        .map(|Query(q)| q)
        .unwrap_or_default();
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());

    let mut ctx = PageContext::new(&config, path);
    ctx.theme = theme_from_headers(headers);
    if query.menu.as_deref() == Some("open") {
        ctx.sidebar = Sidebar::Closed.open(MENU_TRIGGER_ID);
    }
    ctx.contact_status = query.contact.as_deref().and_then(ContactStatus::parse);
    ctx.contact_token = state.nonce.issue(CONTACT_NONCE_ACTION, now_secs());

    let (status, body) = match page {
        Page::Home => (StatusCode::OK, home_page(&ctx)),
        Page::Achievements => (StatusCode::OK, achievements_page(&ctx)),
        Page::NotFound => (StatusCode::NOT_FOUND, not_found_page(&ctx)),
    };

    (
        status,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::VARY, "Cookie, Sec-CH-Prefers-Color-Scheme"),
            (HeaderName::from_static("accept-ch"), "Sec-CH-Prefers-Color-Scheme"),
        ],
        Html(body),
    )
        .into_response()
}

// =============================================================================
// PAGE HANDLERS
// =============================================================================

/// `GET /`
pub async fn home_handler(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    render(&state, &headers, &uri, Page::Home).await
}

/// `GET /achievements`
pub async fn achievements_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    render(&state, &headers, &uri, Page::Achievements).await
}

/// Any unmatched path.
pub async fn not_found_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    render(&state, &headers, &uri, Page::NotFound).await
}

// =============================================================================
// THEME TOGGLE
// =============================================================================

/// `POST /theme`: flip the theme cookie and go back to the page.
pub async fn theme_handler(headers: HeaderMap, Form(form): Form<ThemeForm>) -> Response {
    let next = theme_from_headers(&headers).toggle();
    let cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        THEME_COOKIE,
        next.as_str(),
        THEME_COOKIE_MAX_AGE
    );
    tracing::debug!(theme = next.as_str(), "Theme toggled");
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to(local_path(&form.redirect_to)),
    )
        .into_response()
}

// =============================================================================
// TESTS
// =============================================================================
