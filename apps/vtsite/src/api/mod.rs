//! # vtsite HTTP Module
//!
//! The public site and the admin API, served by axum.
//!
//! ## Public Endpoints
//!
//! - `GET /` - Home page
//! - `GET /achievements` - Achievements page
//! - `POST /contact` - Contact form submission (303 back to the page)
//! - `POST /theme` - Toggle the theme cookie (no-script fallback)
//! - `GET /assets/*` - Static files
//! - `GET /health` - Health check
//! - anything else - 404 page
//!
//! ## Admin Endpoints (Bearer key required)
//!
//! - `GET /admin/schema`, `GET /admin/settings`
//! - `PUT|DELETE /admin/settings/{key}`
//! - `GET|POST /admin/achievements/{category}`
//! - `PATCH|DELETE /admin/achievements/{category}/{index}`
//! - `POST /admin/achievements/{category}/move`
//! - `GET /admin/videos`, `PUT /admin/videos/{slot}`
//! - `POST /admin/videos/{slot}/autofill`
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `VTSITE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `VTSITE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `VTSITE_API_KEY`: Admin API key. Without it the admin API answers 503.

mod admin;
mod auth;
mod contact;
mod handlers;
mod middleware;
mod pages;
mod types;

// Re-exports for external use
pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    AchievementsResponse, ErrorResponse, HealthResponse, IconJson, MoveRequest, PageQuery,
    SchemaEntry, SchemaResponse, SetSettingRequest, SettingResponse, SettingsResponse, ThemeForm,
    UpdateFieldRequest, VideoPatchRequest, VideosResponse,
};

use crate::config::AppConfig;
use crate::mail::{self, Mailer};
use crate::oembed::OembedClient;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use rand::RngCore;
use rand::rngs::OsRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use vtsite_core::{NonceKey, Settings, SiteError};

/// Request bodies above this size are refused.
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// Site settings (one writer at a time).
    pub settings: Arc<RwLock<Settings>>,
    /// Contact form token key.
    pub nonce: Arc<NonceKey>,
    /// Contact mail delivery.
    pub mailer: Arc<dyn Mailer>,
    /// Video title lookups.
    pub oembed: OembedClient,
    /// Recipient used when the `contact_recipient` setting is empty.
    pub fallback_recipient: Option<String>,
    /// Directory served under `/assets`.
    pub assets_dir: PathBuf,
}

impl AppState {
    /// State with the given services and default assets directory.
    #[must_use]
    pub fn new(
        settings: Settings,
        nonce: NonceKey,
        mailer: Arc<dyn Mailer>,
        oembed: OembedClient,
    ) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            nonce: Arc::new(nonce),
            mailer,
            oembed,
            fallback_recipient: None,
            assets_dir: PathBuf::from("assets"),
        }
    }

    /// Build state from the loaded server configuration.
    pub fn from_config(settings: Settings, config: &AppConfig) -> Result<Self, SiteError> {
        let oembed = OembedClient::new(
            &config.autofill.oembed_endpoint,
            config.autofill.timeout_secs,
        )
        .map_err(|e| SiteError::IoError(e.to_string()))?;

        let nonce = match config.security.nonce_secret.as_deref() {
            Some(secret) => NonceKey::from_secret(secret.as_bytes()),
            None => {
                tracing::warn!(
                    "No nonce secret configured (VTSITE_NONCE_SECRET). Using a per-process \
                     secret: contact forms rendered before a restart will be rejected."
                );
                NonceKey::from_secret(&ephemeral_secret())
            }
        };

        let mut state = Self::new(settings, nonce, mail::from_config(&config.mail), oembed)
            .with_assets_dir(config.server.assets_dir.clone());
        if let Some(recipient) = config
            .mail
            .fallback_recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            state = state.with_fallback_recipient(recipient);
        }
        Ok(state)
    }

    #[must_use]
    pub fn with_fallback_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.fallback_recipient = Some(recipient.into());
        self
    }

    #[must_use]
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }
}

/// Seconds since the Unix epoch.
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Secret material that only lives as long as the process.
fn ephemeral_secret() -> [u8; 32] {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    secret
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `VTSITE_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("VTSITE_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (VTSITE_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in VTSITE_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(allowed_methods())
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No VTSITE_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn allowed_methods() -> [Method; 6] {
    [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(allowed_methods())
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - protects against DoS (if enabled)
/// 5. Authentication - admin routes only
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    if get_api_key_from_env().is_some() {
        tracing::info!("Admin API enabled");
    } else {
        tracing::warn!(
            "Admin API DISABLED (answers 503). Set {} to enable it.",
            API_KEY_ENV
        );
    }

    let admin = Router::new()
        .route("/schema", get(admin::schema_handler))
        .route("/settings", get(admin::list_settings_handler))
        .route(
            "/settings/{key}",
            put(admin::set_setting_handler).delete(admin::reset_setting_handler),
        )
        .route(
            "/achievements/{category}",
            get(admin::list_achievements_handler).post(admin::add_achievement_handler),
        )
        .route(
            "/achievements/{category}/move",
            post(admin::move_achievement_handler),
        )
        .route(
            "/achievements/{category}/{index}",
            axum::routing::patch(admin::update_achievement_handler)
                .delete(admin::remove_achievement_handler),
        )
        .route("/videos", get(admin::list_videos_handler))
        .route("/videos/{slot}", put(admin::update_video_handler))
        .route("/videos/{slot}/autofill", post(admin::autofill_handler))
        .route_layer(axum_middleware::from_fn(auth::api_key_auth_middleware));

    let mut router = Router::new()
        .route("/", get(pages::home_handler))
        .route("/achievements", get(pages::achievements_handler))
        .route("/contact", post(contact::contact_handler))
        .route("/theme", post(pages::theme_handler))
        .route("/health", get(handlers::health_handler))
        .nest("/admin", admin)
        .nest_service("/assets", ServeDir::new(&state.assets_dir))
        .fallback(pages::not_found_handler);

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), SiteError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SiteError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("vtsite HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SiteError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_secrets_are_random() {
        let a = ephemeral_secret();
        let b = ephemeral_secret();
        assert_ne!(a, b);
        assert_ne!(a, [0u8; 32]);
    }

    #[test]
    fn from_config_applies_recipient_and_assets() {
        let mut config = AppConfig::default();
        config.mail.fallback_recipient = Some("  owner@example.com ".to_string());
        config.server.assets_dir = PathBuf::from("public");

        let state = AppState::from_config(Settings::in_memory(), &config).expect("state");
        assert_eq!(state.fallback_recipient.as_deref(), Some("owner@example.com"));
        assert_eq!(state.assets_dir, PathBuf::from("public"));
    }

    #[test]
    fn blank_fallback_recipient_is_ignored() {
        let mut config = AppConfig::default();
        config.mail.fallback_recipient = Some("   ".to_string());

        let state = AppState::from_config(Settings::in_memory(), &config).expect("state");
        assert!(state.fallback_recipient.is_none());
    }
}
