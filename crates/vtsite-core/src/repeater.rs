//! # Achievements List Editor
//!
//! One data-driven editor for both achievements lists. The record shape and
//! the icon vocabularies are defined here and nowhere else; the admin API,
//! the CLI and the sanitizer all go through this module.
//!
//! ## Lifecycle
//!
//! ```text
//!   Idle ──(add / remove / update / move)──▶ Editing ──(commit)──▶ Idle
//! ```
//!
//! A commit always writes the WHOLE list to its single settings key. There is
//! no partial update: every mutation round-trips the complete list.

use crate::primitives::MAX_LIST_RECORDS;
use crate::sanitize::{encode_achievements, sanitize_text, sanitize_textarea};
use crate::settings::{Sanitized, Settings};
use crate::{AchievementCategory, AchievementField, AchievementRecord, SiteError};
use serde::Serialize;

// =============================================================================
// ICON VOCABULARIES
// =============================================================================

const PERSONAL_ICONS: &[(&str, &str)] = &[
    ("🎤", "Singing"),
    ("🎮", "Gaming"),
    ("🎉", "Milestone"),
    ("📺", "Streaming"),
    ("🏆", "Award"),
    ("✨", "Debut"),
];

const BUSINESS_ICONS: &[(&str, &str)] = &[
    ("🤝", "Collaboration"),
    ("📢", "Promotion"),
    ("🎬", "Production"),
    ("🛍️", "Merchandise"),
    ("📰", "Media"),
    ("💼", "Sponsorship"),
];

/// Fixed emoji→label mapping for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconVocabulary {
    category: AchievementCategory,
    entries: &'static [(&'static str, &'static str)],
}

/// One selectable icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IconChoice {
    pub icon: &'static str,
    pub label: &'static str,
}

impl IconVocabulary {
    #[must_use]
    pub const fn for_category(category: AchievementCategory) -> Self {
        let entries = match category {
            AchievementCategory::Personal => PERSONAL_ICONS,
            AchievementCategory::Business => BUSINESS_ICONS,
        };
        Self { category, entries }
    }

    #[must_use]
    pub const fn category(&self) -> AchievementCategory {
        self.category
    }

    /// Icon given to freshly added records.
    #[must_use]
    pub fn first(&self) -> &'static str {
        self.entries.first().map(|(icon, _)| *icon).unwrap_or("")
    }

    #[must_use]
    pub fn contains(&self, icon: &str) -> bool {
        self.entries.iter().any(|(i, _)| *i == icon)
    }

    #[must_use]
    pub fn label(&self, icon: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(i, _)| *i == icon)
            .map(|(_, label)| *label)
    }

    pub fn choices(&self) -> impl Iterator<Item = IconChoice> + '_ {
        self.entries
            .iter()
            .map(|&(icon, label)| IconChoice { icon, label })
    }
}

// =============================================================================
// EDITOR
// =============================================================================

/// Whether the editor holds changes that have not been written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorState {
    Idle,
    Editing,
}

/// Editable copy of one achievements list.
#[derive(Debug, Clone)]
pub struct AchievementEditor {
    category: AchievementCategory,
    vocabulary: IconVocabulary,
    records: Vec<AchievementRecord>,
    state: EditorState,
}

impl AchievementEditor {
    /// Start from an explicit list.
    #[must_use]
    pub fn new(category: AchievementCategory, records: Vec<AchievementRecord>) -> Self {
        Self {
            category,
            vocabulary: IconVocabulary::for_category(category),
            records,
            state: EditorState::Idle,
        }
    }

    /// Start from the list currently stored in `settings`.
    pub fn load(category: AchievementCategory, settings: &Settings) -> Result<Self, SiteError> {
        Ok(Self::new(category, settings.achievements(category)?.value))
    }

    #[must_use]
    pub fn category(&self) -> AchievementCategory {
        self.category
    }

    #[must_use]
    pub fn vocabulary(&self) -> IconVocabulary {
        self.vocabulary
    }

    #[must_use]
    pub fn records(&self) -> &[AchievementRecord] {
        &self.records
    }

    #[must_use]
    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Append an empty record with the vocabulary's first icon.
    /// Returns the new record's index.
    pub fn add_record(&mut self) -> Result<usize, SiteError> {
        if self.records.len() >= MAX_LIST_RECORDS {
            return Err(SiteError::ListFull(MAX_LIST_RECORDS));
        }
        self.records.push(AchievementRecord {
            icon: self.vocabulary.first().to_string(),
            ..AchievementRecord::default()
        });
        self.state = EditorState::Editing;
        Ok(self.records.len() - 1)
    }

    /// Delete the record at `index`. Later records shift down by one.
    pub fn remove_record(&mut self, index: usize) -> Result<AchievementRecord, SiteError> {
        self.check_index(index)?;
        self.state = EditorState::Editing;
        Ok(self.records.remove(index))
    }

    /// Set one field of one record. The value is sanitized the same way the
    /// stored list would be.
    pub fn update_field(
        &mut self,
        index: usize,
        field: AchievementField,
        value: &str,
    ) -> Result<(), SiteError> {
        self.check_index(index)?;
        let clean = match field {
            AchievementField::Icon => {
                let icon = value.trim();
                if !icon.is_empty() && !self.vocabulary.contains(icon) {
                    return Err(SiteError::IconNotInVocabulary {
                        icon: icon.to_string(),
                        category: self.category,
                    });
                }
                icon.to_string()
            }
            AchievementField::Description => sanitize_textarea(value),
            AchievementField::Date | AchievementField::Title => sanitize_text(value),
        };
        self.records[index].set_field(field, clean);
        self.state = EditorState::Editing;
        Ok(())
    }

    /// Move the record at `from` so it ends up at `to`.
    pub fn move_record(&mut self, from: usize, to: usize) -> Result<(), SiteError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let record = self.records.remove(from);
            self.records.insert(to, record);
            self.state = EditorState::Editing;
        }
        Ok(())
    }

    /// Visible ordinal labels, one per record.
    #[must_use]
    pub fn ordinal_labels(&self) -> Vec<String> {
        (1..=self.records.len()).map(|n| format!("#{n}")).collect()
    }

    /// The whole list as stored JSON.
    pub fn to_json(&self) -> Result<String, SiteError> {
        encode_achievements(&self.records)
    }

    /// Write the whole list to its settings key and return to `Idle`.
    pub fn commit(&mut self, settings: &mut Settings) -> Result<Sanitized, SiteError> {
        let encoded = self.to_json()?;
        let outcome = settings.set(self.category.settings_key(), &encoded)?;
        self.state = EditorState::Idle;
        Ok(outcome)
    }

    fn check_index(&self, index: usize) -> Result<(), SiteError> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(SiteError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
