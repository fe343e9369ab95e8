//! # Core Type Definitions
//!
//! This module contains the data model shared by every other module:
//! - Achievement records and their category (`AchievementRecord`, `AchievementCategory`)
//! - Featured video entries (`VideoEntry`)
//! - Editable record fields (`AchievementField`)
//! - Error types (`SiteError`)
//!
//! ## Ordering Guarantees
//!
//! Lists are plain `Vec`s. Position is the only identity a record has, and
//! position is display order. Nothing in this crate sorts a list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// ACHIEVEMENTS
// =============================================================================

/// One entry of an achievements list.
///
/// `date` is free text ("YYYY.MM" by convention). It is never validated and
/// only used for display and year grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub icon: String,
    pub date: String,
    pub title: String,
    pub description: String,
}

impl AchievementRecord {
    /// Create a record from its four fields.
    pub fn new(
        icon: impl Into<String>,
        date: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            icon: icon.into(),
            date: date.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// A record with neither title nor description is not rendered.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }

    /// Read one field.
    #[must_use]
    pub fn field(&self, field: AchievementField) -> &str {
        match field {
            AchievementField::Icon => &self.icon,
            AchievementField::Date => &self.date,
            AchievementField::Title => &self.title,
            AchievementField::Description => &self.description,
        }
    }

    /// Overwrite one field.
    pub fn set_field(&mut self, field: AchievementField, value: String) {
        match field {
            AchievementField::Icon => self.icon = value,
            AchievementField::Date => self.date = value,
            AchievementField::Title => self.title = value,
            AchievementField::Description => self.description = value,
        }
    }
}

/// Ordered list of achievements. Editor order is display order.
pub type AchievementList = Vec<AchievementRecord>;

/// Which of the two achievements lists a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Personal,
    Business,
}

impl AchievementCategory {
    /// Both categories, in page order.
    pub const ALL: [Self; 2] = [Self::Personal, Self::Business];

    /// Settings key holding this category's JSON list.
    #[must_use]
    pub const fn settings_key(self) -> &'static str {
        match self {
            Self::Personal => "achievements_personal",
            Self::Business => "achievements_business",
        }
    }

    /// Icon shown when a record has none.
    #[must_use]
    pub const fn default_icon(self) -> &'static str {
        match self {
            Self::Personal => "🏆",
            Self::Business => "💼",
        }
    }

    /// Section heading.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Personal => "Activities",
            Self::Business => "Business",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementCategory {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "business" => Ok(Self::Business),
            other => Err(SiteError::UnknownCategory(other.to_string())),
        }
    }
}

/// Editable field of an achievement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementField {
    Icon,
    Date,
    Title,
    Description,
}

impl AchievementField {
    pub const ALL: [Self; 4] = [Self::Icon, Self::Date, Self::Title, Self::Description];

    /// JSON member name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::Date => "date",
            Self::Title => "title",
            Self::Description => "description",
        }
    }
}

impl FromStr for AchievementField {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| SiteError::UnknownField(s.to_string()))
    }
}

// =============================================================================
// VIDEOS
// =============================================================================

/// One featured video slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VideoEntry {
    pub title: String,
    pub description: String,
    pub url: String,
}

impl VideoEntry {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.url.is_empty()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the site core.
///
/// Malformed stored JSON is NOT an error: it decodes to an empty list.
/// These variants cover caller mistakes and storage failures.
#[derive(Debug, Error)]
pub enum SiteError {
    /// The settings key is not declared in the schema.
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// The achievements category does not exist.
    #[error("Unknown achievements category: {0}")]
    UnknownCategory(String),

    /// The record field does not exist.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A list index was outside the list.
    #[error("Index {index} out of range (list has {len} records)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The list already holds the maximum number of records.
    #[error("List is full ({0} records)")]
    ListFull(usize),

    /// The icon is not part of the category's vocabulary.
    #[error("Icon {icon} is not available for {category} achievements")]
    IconNotInVocabulary {
        icon: String,
        category: AchievementCategory,
    },

    /// Submitted form data was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_record_needs_both_fields_empty() {
        let mut record = AchievementRecord::new("🎤", "2024.01", "", "  ");
        assert!(record.is_blank());

        record.description = "Sang live".to_string();
        assert!(!record.is_blank());
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in AchievementCategory::ALL {
            let parsed: AchievementCategory = category.as_str().parse().expect("parse");
            assert_eq!(parsed, category);
        }
        assert!("corporate".parse::<AchievementCategory>().is_err());
    }

    #[test]
    fn field_accessors_match_names() {
        let mut record = AchievementRecord::default();
        for field in AchievementField::ALL {
            record.set_field(field, field.name().to_string());
        }
        for field in AchievementField::ALL {
            assert_eq!(record.field(field), field.name());
            assert_eq!(field.name().parse::<AchievementField>().expect("parse"), field);
        }
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&AchievementCategory::Business).expect("json");
        assert_eq!(json, "\"business\"");
    }
}
