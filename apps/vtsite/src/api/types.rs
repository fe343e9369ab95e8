//! # API Request/Response Types
//!
//! JSON structures for the admin API, plus the two public form bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vtsite_core::repeater::IconChoice;
use vtsite_core::{
    AchievementCategory, AchievementRecord, AutofillOutcome, Sanitized, SettingDef, SettingValue,
    VideoEntry, VideoPatch,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every failed admin call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// =============================================================================
// SCHEMA / SETTINGS
// =============================================================================

/// One schema entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub key: String,
    /// Kind with its parameters, e.g. `{"type":"achievement_list","category":"personal"}`.
    pub kind: Value,
    pub default: String,
    pub label: String,
}

impl From<&SettingDef> for SchemaEntry {
    fn from(def: &SettingDef) -> Self {
        Self {
            key: def.key.to_string(),
            kind: serde_json::to_value(def.kind).unwrap_or(Value::Null),
            default: def.default.to_string(),
            label: def.label.to_string(),
        }
    }
}

/// Schema listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub success: bool,
    pub settings: Vec<SchemaEntry>,
}

/// Every effective setting value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub success: bool,
    pub settings: serde_json::Map<String, Value>,
    /// Stored keys the schema no longer declares.
    pub orphaned: Vec<String>,
}

impl SettingsResponse {
    pub fn from_snapshot(snapshot: Vec<(&'static str, SettingValue)>, orphaned: Vec<String>) -> Self {
        let settings = snapshot
            .into_iter()
            .map(|(key, value)| {
                (
                    key.to_string(),
                    serde_json::to_value(value).unwrap_or(Value::Null),
                )
            })
            .collect();
        Self {
            success: true,
            settings,
            orphaned,
        }
    }
}

/// `PUT /admin/settings/{key}` body.
///
/// `value` may be a string (stored as submitted, then sanitized) or any JSON
/// value, which is serialized first. Lists can therefore be sent either as
/// JSON text or as a JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSettingRequest {
    pub value: Value,
}

impl SetSettingRequest {
    /// Raw text handed to the sanitizer.
    pub fn raw_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Result of writing or resetting one setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingResponse {
    pub success: bool,
    pub key: String,
    /// Effective value after the write.
    pub value: Value,
    pub dropped_fields: usize,
    pub dropped_records: usize,
    pub malformed: bool,
}

impl SettingResponse {
    pub fn written(sanitized: &Sanitized, value: SettingValue) -> Self {
        Self {
            success: true,
            key: sanitized.key.to_string(),
            value: serde_json::to_value(value).unwrap_or(Value::Null),
            dropped_fields: sanitized.dropped_fields,
            dropped_records: sanitized.dropped_records,
            malformed: sanitized.malformed,
        }
    }

    pub fn reset(key: &str, value: SettingValue) -> Self {
        Self {
            success: true,
            key: key.to_string(),
            value: serde_json::to_value(value).unwrap_or(Value::Null),
            dropped_fields: 0,
            dropped_records: 0,
            malformed: false,
        }
    }
}

// =============================================================================
// ACHIEVEMENTS
// =============================================================================

/// Icon option for the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconJson {
    pub icon: String,
    pub label: String,
}

impl From<IconChoice> for IconJson {
    fn from(choice: IconChoice) -> Self {
        Self {
            icon: choice.icon.to_string(),
            label: choice.label.to_string(),
        }
    }
}

/// A category's list as the editor shows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementsResponse {
    pub success: bool,
    pub category: AchievementCategory,
    pub records: Vec<AchievementRecord>,
    /// `#1`, `#2`, ... one per record.
    pub labels: Vec<String>,
    pub icons: Vec<IconJson>,
    /// Index touched by the call (added record), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// `PATCH /admin/achievements/{category}/{index}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFieldRequest {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

/// `POST /admin/achievements/{category}/move` body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

// =============================================================================
// VIDEOS
// =============================================================================

/// `PUT /admin/videos/{slot}` body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoPatchRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl From<VideoPatchRequest> for VideoPatch {
    fn from(req: VideoPatchRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            url: req.url,
        }
    }
}

/// The featured video slots after a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideosResponse {
    pub success: bool,
    pub videos: Vec<VideoEntry>,
    /// Autofill result: `filled`, `failed` or `superseded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autofill: Option<String>,
}

impl VideosResponse {
    pub fn new(videos: Vec<VideoEntry>) -> Self {
        Self {
            success: true,
            videos,
            autofill: None,
        }
    }

    pub fn with_outcome(mut self, outcome: &AutofillOutcome) -> Self {
        self.autofill = Some(
            match outcome {
                AutofillOutcome::Filled(_) => "filled",
                AutofillOutcome::Failed => "failed",
                AutofillOutcome::Superseded => "superseded",
            }
            .to_string(),
        );
        self
    }
}

// =============================================================================
// PUBLIC FORMS
// =============================================================================

/// `POST /theme` form body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeForm {
    #[serde(default)]
    pub redirect_to: String,
}

/// Query string of the public pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    /// `open` renders the sidebar open (no-script menu).
    #[serde(default)]
    pub menu: Option<String>,
    /// Contact outcome banner.
    #[serde(default)]
    pub contact: Option<String>,
}
