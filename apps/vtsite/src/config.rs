//! # Server Configuration
//!
//! Operator settings for the binary, read from `vtsite.toml`.
//!
//! Site content (titles, achievements, videos, ...) is NOT configured here;
//! it lives in the settings database and is edited through the admin API or
//! the CLI. This file only covers how the server runs.
//!
//! ## Precedence
//!
//! CLI flags > environment variables > `vtsite.toml` > built-in defaults.
//!
//! ## Environment Variables
//!
//! - `VTSITE_NONCE_SECRET`: secret for contact form tokens
//! - `VTSITE_API_KEY`, `VTSITE_CORS_ORIGINS`, `VTSITE_RATE_LIMIT`: read by the
//!   API layer at router construction

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vtsite_core::primitives::AUTOFILL_TIMEOUT_SECS;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "vtsite.toml";

/// Environment variable holding the contact token secret.
pub const NONCE_SECRET_ENV: &str = "VTSITE_NONCE_SECRET";

// =============================================================================
// ERRORS
// =============================================================================

/// Problems loading `vtsite.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub autofill: AutofillConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/assets`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            assets_dir: default_assets_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Settings database (redb)
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Keep settings in memory only; nothing is written to `database`
    #[serde(default)]
    pub ephemeral: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            ephemeral: false,
        }
    }
}

/// Where contact mail goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// Write `.eml` files into `spool_dir` for a local MTA to pick up.
    #[default]
    Spool,
    /// Only log the message.
    Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub backend: MailBackend,

    /// Spool directory for the `spool` backend
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,

    /// `From:` header of outgoing mail
    #[serde(default = "default_mail_from")]
    pub from: String,

    /// Recipient used when the `contact_recipient` setting is empty
    #[serde(default)]
    pub fallback_recipient: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackend::default(),
            spool_dir: default_spool_dir(),
            from: default_mail_from(),
            fallback_recipient: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutofillConfig {
    /// oEmbed endpoint queried for video titles
    #[serde(default = "default_oembed_endpoint")]
    pub oembed_endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_autofill_timeout")]
    pub timeout_secs: u64,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            oembed_endpoint: default_oembed_endpoint(),
            timeout_secs: default_autofill_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Contact token secret. Prefer `VTSITE_NONCE_SECRET` over writing it here.
    #[serde(default)]
    pub nonce_secret: Option<String>,
}

// Defaults
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_assets_dir() -> PathBuf { PathBuf::from("assets") }
fn default_database() -> PathBuf { PathBuf::from("vtsite.redb") }
fn default_spool_dir() -> PathBuf { PathBuf::from("mail-spool") }
fn default_mail_from() -> String { "vtsite@localhost".to_string() }
fn default_oembed_endpoint() -> String { "https://www.youtube.com/oembed".to_string() }
fn default_autofill_timeout() -> u64 { AUTOFILL_TIMEOUT_SECS }

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Parse config text.
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, then apply environment overrides.
    ///
    /// A missing file is only an error when `required` is set; otherwise
    /// the defaults apply.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, &path.display().to_string())?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay environment variables.
    pub fn apply_env(&mut self) {
        if let Some(secret) = std::env::var(NONCE_SECRET_ENV)
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.security.nonce_secret = Some(secret);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.autofill.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "autofill.timeout_secs must be at least 1".to_string(),
            ));
        }
        if !self.autofill.oembed_endpoint.starts_with("http://")
            && !self.autofill.oembed_endpoint.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "autofill.oembed_endpoint must be an http(s) URL, got '{}'",
                self.autofill.oembed_endpoint
            )));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Commented starting point written by `vtsite init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# vtsite server configuration.
# Site content is stored in the settings database, not here.

[server]
host = "127.0.0.1"
port = 8080
assets_dir = "assets"

[storage]
database = "vtsite.redb"

[mail]
# "spool" writes .eml files for a local MTA, "log" only logs them.
backend = "spool"
spool_dir = "mail-spool"
from = "vtsite@localhost"
# fallback_recipient = "you@example.com"

[autofill]
oembed_endpoint = "https://www.youtube.com/oembed"
timeout_secs = 15

[security]
# Set VTSITE_NONCE_SECRET instead of writing the secret here.
# nonce_secret = ""
"#;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("", "test").expect("parse");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.database, PathBuf::from("vtsite.redb"));
        assert_eq!(config.mail.backend, MailBackend::Spool);
        assert_eq!(config.autofill.timeout_secs, AUTOFILL_TIMEOUT_SECS);
    }

    #[test]
    fn default_template_parses() {
        let config = AppConfig::from_toml(DEFAULT_CONFIG_TOML, "template").expect("parse");
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert!(config.security.nonce_secret.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            "[server]\nport = 9000\n[mail]\nbackend = \"log\"\n",
            "test",
        )
        .expect("parse");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.mail.backend, MailBackend::Log);
        assert_eq!(config.mail.spool_dir, PathBuf::from("mail-spool"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_toml("[autofill]\ntimeout_secs = 0\n", "test"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[autofill]\noembed_endpoint = \"ftp://x\"\n", "test"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[server]\nport = \"eighty\"\n", "test"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_optional_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load(&dir.path().join("absent.toml"), false).expect("load");
        assert_eq!(config.server.port, 8080);
        assert!(AppConfig::load(&dir.path().join("absent.toml"), true).is_err());
    }
}
