//! # Featured Videos
//!
//! YouTube URL handling and the bookkeeping around title autofill. The
//! network fetch itself lives in the app; this module decides what a fetch
//! result is allowed to overwrite.

use crate::primitives::{AUTOFILL_FAILURE_SENTINEL, VIDEO_SLOTS};
use crate::{SiteError, VideoEntry};

const YOUTUBE_HOSTS: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

/// Extract the video id from the common YouTube URL shapes:
/// `watch?v=`, `youtu.be/`, `/embed/`, `/shorts/`, `/live/`.
pub fn youtube_video_id(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?;

    let candidate = if host == "youtu.be" {
        parsed.path_segments()?.next().map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host) {
        let mut segments = parsed.path_segments()?;
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed" | "shorts" | "live") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| {
        !id.is_empty()
            && id.len() <= 32
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

/// Privacy-enhanced embed URL for a video id.
#[must_use]
pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube-nocookie.com/embed/{video_id}")
}

/// Check a slot index.
pub fn check_slot(slot: usize) -> Result<(), SiteError> {
    if slot < VIDEO_SLOTS {
        Ok(())
    } else {
        Err(SiteError::IndexOutOfRange {
            index: slot,
            len: VIDEO_SLOTS,
        })
    }
}

/// Partial update of one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl VideoPatch {
    /// Apply to `entries[slot]`.
    pub fn apply(self, entries: &mut [VideoEntry], slot: usize) -> Result<(), SiteError> {
        check_slot(slot)?;
        let entry = entries.get_mut(slot).ok_or(SiteError::IndexOutOfRange {
            index: slot,
            len: VIDEO_SLOTS,
        })?;
        if let Some(title) = self.title {
            entry.title = title;
        }
        if let Some(description) = self.description {
            entry.description = description;
        }
        if let Some(url) = self.url {
            entry.url = url;
        }
        Ok(())
    }
}

/// Remembers which URL an autofill fetch was started for.
///
/// The fetched title is only written if the slot still holds that URL when
/// the fetch completes, so a slow fetch cannot overwrite a newer edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutofillTicket {
    pub slot: usize,
    pub url: String,
}

/// What happened to an autofill result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutofillOutcome {
    /// Title written.
    Filled(String),
    /// Fetch failed; the failure sentinel was written.
    Failed,
    /// The slot's URL changed while fetching; nothing written.
    Superseded,
}

impl AutofillTicket {
    /// Start a ticket for the URL currently in `entries[slot]`.
    pub fn start(entries: &[VideoEntry], slot: usize) -> Result<Self, SiteError> {
        check_slot(slot)?;
        let url = entries
            .get(slot)
            .map(|e| e.url.clone())
            .unwrap_or_default();
        if url.is_empty() {
            return Err(SiteError::InvalidInput(format!("video slot {slot} has no URL")));
        }
        Ok(Self { slot, url })
    }

    #[must_use]
    pub fn still_current(&self, entries: &[VideoEntry]) -> bool {
        entries.get(self.slot).is_some_and(|e| e.url == self.url)
    }

    /// Apply a fetch result (title or failure) to the current entries.
    pub fn complete(
        &self,
        entries: &mut [VideoEntry],
        fetched: Option<String>,
    ) -> AutofillOutcome {
        if !self.still_current(entries) {
            return AutofillOutcome::Superseded;
        }
        let Some(entry) = entries.get_mut(self.slot) else {
            return AutofillOutcome::Superseded;
        };
        match fetched {
            Some(title) => {
                entry.title.clone_from(&title);
                AutofillOutcome::Filled(title)
            }
            None => {
                entry.title = AUTOFILL_FAILURE_SENTINEL.to_string();
                AutofillOutcome::Failed
            }
        }
    }
}
