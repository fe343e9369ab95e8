//! # vtsite-core
//!
//! Everything the site does that is not HTTP - THE LOGIC.
//!
//! ## Layers
//!
//! ```text
//!   storage  (raw key -> text, memory or redb)
//!      ▲
//!   settings (schema, defaults, sanitizers)  ◀── repeater (list editor)
//!      │
//!      ▼
//!   SiteConfig (typed snapshot) ──▶ render (pages, JSON-LD)
//! ```
//!
//! Side modules: `contact` (form validation and mail composition), `nonce`
//! (anti-forgery tokens), `presentation` (theme / loading / sidebar state),
//! `video` (YouTube URLs and autofill bookkeeping).
//!
//! ## Constraints
//!
//! - No async, no network, no logging. Functions return what happened and
//!   the app decides what to log.
//! - Stored list JSON never produces an error: malformed input is an empty list.

// =============================================================================
// MODULES
// =============================================================================

pub mod contact;
pub mod nonce;
pub mod presentation;
pub mod primitives;
pub mod render;
pub mod repeater;
pub mod sanitize;
pub mod settings;
pub mod storage;
pub mod types;
pub mod video;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    AchievementCategory, AchievementField, AchievementList, AchievementRecord, SiteError,
    VideoEntry,
};

// =============================================================================
// RE-EXPORTS: Settings and Editing
// =============================================================================

pub use repeater::{AchievementEditor, EditorState, IconVocabulary};
pub use settings::{
    SCHEMA, Sanitized, SettingDef, SettingKind, SettingValue, Settings, SiteConfig,
};
pub use storage::{MemoryStore, RedbStore, SettingsStore};

// =============================================================================
// RE-EXPORTS: Request-side helpers
// =============================================================================

pub use contact::{ContactForm, ContactRejection, ContactStatus, OutgoingMail};
pub use nonce::NonceKey;
pub use presentation::{LoadingScreen, Sidebar, ThemeMode};
pub use render::{PageContext, achievements_page, home_page, not_found_page};
pub use video::{AutofillOutcome, AutofillTicket, VideoPatch};
