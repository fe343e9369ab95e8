//! # Settings
//!
//! The site's configuration store: a flat map of string keys, each declared
//! once in [`SCHEMA`] with a kind, a default and (through the kind) a
//! sanitizer.
//!
//! - Reads return the stored value or the declared default.
//! - Writes sanitize first, then persist immediately.
//! - List settings are stored as JSON text and decoded through the same
//!   lenient decoder on every read, so hand-edited or stale values are
//!   coerced exactly as a fresh write would be.
//!
//! Templates do not read this module directly. They get a [`SiteConfig`],
//! built once per request.

mod site;

pub use site::{LoadWarning, SiteConfig, SocialLink};

use crate::sanitize::{
    Decoded, coerce_bool, decode_achievements, decode_videos, encode_achievements, encode_videos,
    sanitize_image_stem, sanitize_text, sanitize_textarea, sanitize_url,
};
use crate::storage::{MemoryStore, RedbStore, SettingsStore};
use crate::{AchievementCategory, AchievementRecord, SiteError, VideoEntry};
use serde::Serialize;
use std::path::Path;

// =============================================================================
// SCHEMA
// =============================================================================

/// How a setting is typed and sanitized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "category", rename_all = "snake_case")]
pub enum SettingKind {
    Text,
    Textarea,
    Url,
    Bool,
    Image,
    AchievementList(AchievementCategory),
    VideoList,
}

/// Declaration of one settings key.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettingDef {
    pub key: &'static str,
    pub kind: SettingKind,
    pub default: &'static str,
    pub label: &'static str,
}

const fn def(
    key: &'static str,
    kind: SettingKind,
    default: &'static str,
    label: &'static str,
) -> SettingDef {
    SettingDef {
        key,
        kind,
        default,
        label,
    }
}

/// Every settings key the site knows, in admin display order.
pub static SCHEMA: &[SettingDef] = &[
    def("site_title", SettingKind::Text, "Hoshimiya Rin Official Site", "Site title"),
    def("vtuber_name", SettingKind::Text, "Hoshimiya Rin", "VTuber name"),
    def("tagline", SettingKind::Text, "Virtual singer & streamer", "Tagline"),
    def(
        "about_text",
        SettingKind::Textarea,
        "A virtual singer who streams karaoke, games and late-night talks.\nNew covers every month.",
        "About text",
    ),
    def("site_url", SettingKind::Url, "https://example.com", "Canonical site URL"),
    def("hero_image", SettingKind::Image, "hero", "Hero image file stem"),
    def("logo_image", SettingKind::Image, "logo", "Logo image file stem"),
    def("youtube_url", SettingKind::Url, "", "YouTube channel"),
    def("twitter_url", SettingKind::Url, "", "X (Twitter) profile"),
    def("twitch_url", SettingKind::Url, "", "Twitch channel"),
    def("tiktok_url", SettingKind::Url, "", "TikTok profile"),
    def("instagram_url", SettingKind::Url, "", "Instagram profile"),
    def("contact_enabled", SettingKind::Bool, "1", "Show contact form"),
    def("contact_recipient", SettingKind::Text, "", "Contact recipient address"),
    def("loading_screen_enabled", SettingKind::Bool, "1", "Show loading screen"),
    def(
        "achievements_personal",
        SettingKind::AchievementList(AchievementCategory::Personal),
        "[]",
        "Activity achievements",
    ),
    def(
        "achievements_business",
        SettingKind::AchievementList(AchievementCategory::Business),
        "[]",
        "Business achievements",
    ),
    def("featured_videos", SettingKind::VideoList, "[]", "Featured videos"),
];

/// Find a key's declaration.
pub fn lookup(key: &str) -> Result<&'static SettingDef, SiteError> {
    SCHEMA
        .iter()
        .find(|d| d.key == key)
        .ok_or_else(|| SiteError::UnknownSetting(key.to_string()))
}

/// Output of running a sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sanitized {
    pub key: &'static str,
    /// The value that was (or would be) stored.
    pub stored: String,
    pub dropped_fields: usize,
    pub dropped_records: usize,
    pub malformed: bool,
}

impl SettingDef {
    /// Apply this key's sanitizer to a raw submitted value.
    pub fn sanitize(&self, raw: &str) -> Result<Sanitized, SiteError> {
        let scalar = |stored: String| Sanitized {
            key: self.key,
            stored,
            dropped_fields: 0,
            dropped_records: 0,
            malformed: false,
        };
        let listed = |stored: String, counts: (usize, usize, bool)| Sanitized {
            key: self.key,
            stored,
            dropped_fields: counts.0,
            dropped_records: counts.1,
            malformed: counts.2,
        };

        Ok(match self.kind {
            SettingKind::Text => scalar(sanitize_text(raw)),
            SettingKind::Textarea => scalar(sanitize_textarea(raw)),
            SettingKind::Url => scalar(sanitize_url(raw)),
            SettingKind::Bool => scalar(if coerce_bool(raw) { "1" } else { "0" }.to_string()),
            SettingKind::Image => scalar(sanitize_image_stem(raw)),
            SettingKind::AchievementList(category) => {
                let decoded = decode_achievements(raw, category);
                listed(encode_achievements(&decoded.value)?, counts(&decoded))
            }
            SettingKind::VideoList => {
                let decoded = decode_videos(raw);
                listed(encode_videos(&decoded.value)?, counts(&decoded))
            }
        })
    }
}

fn counts<T>(decoded: &Decoded<T>) -> (usize, usize, bool) {
    (decoded.dropped_fields, decoded.dropped_records, decoded.malformed)
}

// =============================================================================
// TYPED VALUES
// =============================================================================

/// A setting's effective value, decoded according to its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Text(String),
    Bool(bool),
    Achievements(Vec<AchievementRecord>),
    Videos(Vec<VideoEntry>),
}

impl SettingValue {
    fn decode(def: &SettingDef, raw: &str) -> Self {
        match def.kind {
            SettingKind::Text
            | SettingKind::Textarea
            | SettingKind::Url
            | SettingKind::Image => Self::Text(raw.to_string()),
            SettingKind::Bool => Self::Bool(coerce_bool(raw)),
            SettingKind::AchievementList(category) => {
                Self::Achievements(decode_achievements(raw, category).value)
            }
            SettingKind::VideoList => Self::Videos(decode_videos(raw).value),
        }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Storage backend for [`Settings`].
#[derive(Debug)]
pub enum SettingsBackend {
    /// In-memory map (volatile).
    InMemory(MemoryStore),
    /// Disk-backed redb database.
    Persistent(RedbStore),
}

impl Default for SettingsBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

/// Schema-aware settings over a raw store.
#[derive(Debug, Default)]
pub struct Settings {
    backend: SettingsBackend,
}

impl Settings {
    /// Settings backed by an in-memory map.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Settings backed by a redb database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SiteError> {
        Ok(Self {
            backend: SettingsBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Whether writes reach disk.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, SettingsBackend::Persistent(_))
    }

    fn store(&self) -> &dyn SettingsStore {
        match &self.backend {
            SettingsBackend::InMemory(s) => s,
            SettingsBackend::Persistent(s) => s,
        }
    }

    fn store_mut(&mut self) -> &mut dyn SettingsStore {
        match &mut self.backend {
            SettingsBackend::InMemory(s) => s,
            SettingsBackend::Persistent(s) => s,
        }
    }

    /// Effective stored text of `key`: stored value or declared default.
    pub fn get_raw(&self, key: &str) -> Result<String, SiteError> {
        let def = lookup(key)?;
        Ok(self
            .store()
            .get_raw(key)?
            .unwrap_or_else(|| def.default.to_string()))
    }

    /// Stored text of `key`, or `default` when nothing is stored.
    pub fn get_or(&self, key: &str, default: &str) -> Result<String, SiteError> {
        lookup(key)?;
        Ok(self
            .store()
            .get_raw(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Effective value of `key`, decoded by kind.
    pub fn get(&self, key: &str) -> Result<SettingValue, SiteError> {
        let def = lookup(key)?;
        let raw = self.get_raw(key)?;
        Ok(SettingValue::decode(def, &raw))
    }

    /// Whether a value is stored for `key` (as opposed to the default).
    pub fn is_set(&self, key: &str) -> Result<bool, SiteError> {
        lookup(key)?;
        Ok(self.store().get_raw(key)?.is_some())
    }

    /// Sanitize `raw` with the key's sanitizer and persist the result.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<Sanitized, SiteError> {
        let def = lookup(key)?;
        let sanitized = def.sanitize(raw)?;
        self.store_mut().put_raw(def.key, &sanitized.stored)?;
        Ok(sanitized)
    }

    /// Drop the stored value so the default applies again.
    pub fn reset(&mut self, key: &str) -> Result<bool, SiteError> {
        let def = lookup(key)?;
        self.store_mut().remove(def.key)
    }

    /// Single-line or multi-line text setting.
    pub fn text(&self, key: &str) -> Result<String, SiteError> {
        self.get_raw(key)
    }

    /// Boolean setting.
    pub fn flag(&self, key: &str) -> Result<bool, SiteError> {
        Ok(coerce_bool(&self.get_raw(key)?))
    }

    /// Decoded achievements list for a category.
    pub fn achievements(
        &self,
        category: AchievementCategory,
    ) -> Result<Decoded<Vec<AchievementRecord>>, SiteError> {
        let raw = self.get_raw(category.settings_key())?;
        Ok(decode_achievements(&raw, category))
    }

    /// Decoded featured videos, always [`crate::primitives::VIDEO_SLOTS`] long.
    pub fn videos(&self) -> Result<Decoded<Vec<VideoEntry>>, SiteError> {
        let raw = self.get_raw("featured_videos")?;
        Ok(decode_videos(&raw))
    }

    /// Replace the featured videos wholesale.
    pub fn set_videos(&mut self, entries: &[VideoEntry]) -> Result<Sanitized, SiteError> {
        let encoded = encode_videos(entries)?;
        self.set("featured_videos", &encoded)
    }

    /// Every schema key with its effective value, in schema order.
    pub fn snapshot(&self) -> Result<Vec<(&'static str, SettingValue)>, SiteError> {
        SCHEMA
            .iter()
            .map(|def| Ok((def.key, self.get(def.key)?)))
            .collect()
    }

    /// Stored keys that the schema does not declare.
    pub fn orphaned_keys(&self) -> Result<Vec<String>, SiteError> {
        Ok(self
            .store()
            .entries()?
            .into_iter()
            .map(|(k, _)| k)
            .filter(|k| lookup(k).is_err())
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
