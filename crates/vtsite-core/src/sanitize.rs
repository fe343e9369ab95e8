//! # Sanitizers
//!
//! Write-side (and load-side) cleaning for every settings kind.
//!
//! Sanitizing is about what gets STORED. Escaping for output is the
//! renderer's job and happens regardless of what the sanitizers did.
//!
//! List decoding never fails: input that is not a JSON array becomes an empty
//! list, elements that are not objects are dropped, unknown members are
//! dropped. The [`Decoded`] wrapper reports how much was thrown away so the
//! caller can log it.

use crate::primitives::{
    MAX_IMAGE_STEM_LENGTH, MAX_LIST_RECORDS, MAX_TEXT_LENGTH, MAX_TEXTAREA_LENGTH, VIDEO_SLOTS,
};
use crate::repeater::IconVocabulary;
use crate::{AchievementCategory, AchievementField, AchievementRecord, SiteError, VideoEntry};
use serde_json::{Map, Value};

// =============================================================================
// SCALAR SANITIZERS
// =============================================================================

/// Single-line text: control characters and markup tags removed,
/// whitespace (including newlines) collapsed to single spaces, trimmed.
pub fn sanitize_text(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = strip_tags(&spaced)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    truncate_chars(&collapsed, MAX_TEXT_LENGTH).trim_end().to_string()
}

/// Multi-line text: like [`sanitize_text`] but line breaks survive.
pub fn sanitize_textarea(raw: &str) -> String {
    let normalized: String = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| matches!(c, '\n' | '\t') || !c.is_control())
        .collect();
    let stripped = strip_tags(&normalized);
    let joined = stripped
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(joined.trim(), MAX_TEXTAREA_LENGTH)
        .trim_end()
        .to_string()
}

/// Absolute `http`/`https` URL or the empty string.
pub fn sanitize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '<' | '>' | '`'))
    {
        return String::new();
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            trimmed.to_string()
        }
        _ => String::new(),
    }
}

/// Checkbox-style coercion. Only an explicit "on" value is true.
pub fn coerce_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Image file stem: `[A-Za-z0-9_-]` only, bounded length, else empty.
pub fn sanitize_image_stem(raw: &str) -> String {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed.chars().count() <= MAX_IMAGE_STEM_LENGTH
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        trimmed.to_string()
    } else {
        String::new()
    }
}

/// Remove anything that looks like a markup tag or comment.
///
/// A `<` not followed by a letter, `/`, `!` or `?` is kept, so "a < b"
/// survives. Runs until nothing changes, so removing one tag cannot leave
/// another behind.
pub fn strip_tags(raw: &str) -> String {
    let mut current = strip_tags_once(raw);
    loop {
        let next = strip_tags_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_tags_once(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '<' {
            let opens_tag = chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?'));
            if opens_tag {
                for skipped in chars.by_ref() {
                    if skipped == '>' {
                        break;
                    }
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// =============================================================================
// LIST DECODING
// =============================================================================

/// Result of decoding a stored list, with a count of discarded input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded<T> {
    pub value: T,
    /// Members that were unknown or had a non-scalar value.
    pub dropped_fields: usize,
    /// Array elements that were not objects, or past the length cap.
    pub dropped_records: usize,
    /// The input was present but not a JSON array.
    pub malformed: bool,
}

impl<T> Decoded<T> {
    /// Whether anything at all was discarded.
    pub fn is_lossless(&self) -> bool {
        self.dropped_fields == 0 && self.dropped_records == 0 && !self.malformed
    }
}

/// Decode an achievements list from its stored JSON text.
///
/// Every field goes through the text sanitizers, and icons outside the
/// category's vocabulary are cleared.
pub fn decode_achievements(raw: &str, category: AchievementCategory) -> Decoded<Vec<AchievementRecord>> {
    let vocabulary = IconVocabulary::for_category(category);
    let (elements, malformed) = parse_array(raw);
    let mut decoded: Decoded<Vec<AchievementRecord>> = Decoded {
        malformed,
        ..Decoded::default()
    };

    for element in elements {
        let Value::Object(object) = element else {
            decoded.dropped_records += 1;
            continue;
        };
        if decoded.value.len() >= MAX_LIST_RECORDS {
            decoded.dropped_records += 1;
            continue;
        }
        let mut record = AchievementRecord::default();
        decoded.dropped_fields += fill_known_fields(&object, |name, value| {
            let field = name.parse::<AchievementField>().ok()?;
            let clean = match field {
                AchievementField::Description => sanitize_textarea(value),
                AchievementField::Icon => {
                    let icon = value.trim();
                    if vocabulary.contains(icon) {
                        icon.to_string()
                    } else {
                        String::new()
                    }
                }
                AchievementField::Date | AchievementField::Title => sanitize_text(value),
            };
            record.set_field(field, clean);
            Some(())
        });
        decoded.value.push(record);
    }
    decoded
}

/// Decode the featured video list. The result always has exactly
/// [`VIDEO_SLOTS`] entries.
pub fn decode_videos(raw: &str) -> Decoded<Vec<VideoEntry>> {
    let (elements, malformed) = parse_array(raw);
    let mut decoded: Decoded<Vec<VideoEntry>> = Decoded {
        malformed,
        ..Decoded::default()
    };

    for element in elements {
        let Value::Object(object) = element else {
            decoded.dropped_records += 1;
            continue;
        };
        if decoded.value.len() >= VIDEO_SLOTS {
            decoded.dropped_records += 1;
            continue;
        }
        let mut entry = VideoEntry::default();
        decoded.dropped_fields += fill_known_fields(&object, |name, value| {
            match name {
                "title" => entry.title = sanitize_text(value),
                "description" => entry.description = sanitize_textarea(value),
                "url" => entry.url = sanitize_url(value),
                _ => return None,
            }
            Some(())
        });
        decoded.value.push(entry);
    }
    decoded.value.resize(VIDEO_SLOTS, VideoEntry::default());
    decoded
}

/// Canonical stored form of an achievements list.
pub fn encode_achievements(records: &[AchievementRecord]) -> Result<String, SiteError> {
    serde_json::to_string(records).map_err(|e| SiteError::SerializationError(e.to_string()))
}

/// Canonical stored form of the video list.
pub fn encode_videos(entries: &[VideoEntry]) -> Result<String, SiteError> {
    serde_json::to_string(entries).map_err(|e| SiteError::SerializationError(e.to_string()))
}

/// Parse `raw` as a JSON array. Empty input is an empty array, anything
/// else that is not an array is reported as malformed.
fn parse_array(raw: &str) -> (Vec<Value>, bool) {
    if raw.trim().is_empty() {
        return (Vec::new(), false);
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(elements)) => (elements, false),
        _ => (Vec::new(), true),
    }
}

/// Feed each scalar member to `apply`. Returns how many members were
/// dropped, either because `apply` did not know the name or because the
/// value was an array/object.
fn fill_known_fields(
    object: &Map<String, Value>,
    mut apply: impl FnMut(&str, &str) -> Option<()>,
) -> usize {
    let mut dropped = 0;
    for (name, value) in object {
        let scalar = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => {
                dropped += 1;
                continue;
            }
        };
        if apply(name, &scalar).is_none() {
            dropped += 1;
        }
    }
    dropped
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_strips_tags_and_collapses_whitespace() {
        assert_eq!(
            sanitize_text("  <b>Hello</b>\n  <script>x</script>world  "),
            "Hello xworld"
        );
        assert_eq!(sanitize_text("a < b"), "a < b");
    }

    #[test]
    fn nested_tags_do_not_survive() {
        assert_eq!(strip_tags("<<a>b>hi"), "hi");
    }

    #[test]
    fn textarea_keeps_line_breaks() {
        assert_eq!(
            sanitize_textarea("line one\r\nline <i>two</i>  \n"),
            "line one\nline two"
        );
    }

    #[test]
    fn textarea_trims_each_line_after_tag_removal() {
        assert_eq!(
            sanitize_textarea("  <p>first</p>   \n<b>second</b>\t\n\n  third <br>"),
            "first\nsecond\n\n  third"
        );
        assert_eq!(sanitize_textarea("<div>\n</div>"), "");
    }

    #[test]
    fn url_accepts_only_http_schemes() {
        assert_eq!(sanitize_url(" https://youtube.com/@rin "), "https://youtube.com/@rin");
        assert_eq!(sanitize_url("http://example.com"), "http://example.com");
        assert_eq!(sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_url("ftp://example.com"), "");
        assert_eq!(sanitize_url("not a url"), "");
        assert_eq!(sanitize_url("https://exa\"mple.com"), "");
    }

    #[test]
    fn bool_coercion() {
        for truthy in ["1", "true", "ON", " yes "] {
            assert!(coerce_bool(truthy), "{truthy}");
        }
        for falsy in ["0", "", "false", "nope"] {
            assert!(!coerce_bool(falsy), "{falsy}");
        }
    }

    #[test]
    fn image_stem_rejects_paths() {
        assert_eq!(sanitize_image_stem("hero_2024"), "hero_2024");
        assert_eq!(sanitize_image_stem("../etc/passwd"), "");
        assert_eq!(sanitize_image_stem("logo.png"), "");
    }

    #[test]
    fn non_array_decodes_to_empty_list() {
        for raw in ["", "{}", "\"text\"", "not json", "42", "null"] {
            let decoded = decode_achievements(raw, AchievementCategory::Personal);
            assert!(decoded.value.is_empty(), "{raw}");
        }
        assert!(decode_achievements("{}", AchievementCategory::Personal).malformed);
        assert!(!decode_achievements("", AchievementCategory::Personal).malformed);
    }

    #[test]
    fn malformed_input_keeps_flag_and_zero_counts() {
        let achievements = decode_achievements("{\"title\":\"x\"}", AchievementCategory::Business);
        assert_eq!(
            achievements,
            Decoded {
                value: Vec::new(),
                dropped_fields: 0,
                dropped_records: 0,
                malformed: true,
            }
        );

        let videos = decode_videos("[1, 2");
        assert!(videos.malformed);
        assert_eq!(videos.dropped_records, 0);
        assert_eq!(videos.value, vec![VideoEntry::default(); VIDEO_SLOTS]);
    }

    #[test]
    fn unknown_fields_and_non_objects_are_dropped() {
        let raw = r#"[
            {"icon":"🎤","date":"2024.01","title":"Live","description":"First","color":"red"},
            "stray",
            {"title":"Second","extra":{"nested":true}}
        ]"#;
        let decoded = decode_achievements(raw, AchievementCategory::Personal);

        assert_eq!(decoded.value.len(), 2);
        assert_eq!(decoded.value[0].title, "Live");
        assert_eq!(decoded.value[1].title, "Second");
        assert_eq!(decoded.dropped_fields, 2);
        assert_eq!(decoded.dropped_records, 1);
        assert!(!decoded.is_lossless());
    }

    #[test]
    fn scalars_are_coerced_to_strings() {
        let decoded = decode_achievements(r#"[{"date":2024,"title":true}]"#, AchievementCategory::Personal);
        assert_eq!(decoded.value[0].date, "2024");
        assert_eq!(decoded.value[0].title, "true");
    }

    #[test]
    fn icons_outside_vocabulary_are_cleared() {
        let raw = r#"[{"icon":"🤝","title":"Collab"}]"#;
        assert_eq!(decode_achievements(raw, AchievementCategory::Personal).value[0].icon, "");
        assert_eq!(decode_achievements(raw, AchievementCategory::Business).value[0].icon, "🤝");
    }

    #[test]
    fn videos_always_fill_three_slots() {
        let decoded = decode_videos(r#"[{"title":"MV","url":"https://youtu.be/abc"}]"#);
        assert_eq!(decoded.value.len(), VIDEO_SLOTS);
        assert_eq!(decoded.value[0].title, "MV");
        assert!(decoded.value[2].is_empty());

        let many = r#"[{"title":"1"},{"title":"2"},{"title":"3"},{"title":"4"}]"#;
        let decoded = decode_videos(many);
        assert_eq!(decoded.value.len(), VIDEO_SLOTS);
        assert_eq!(decoded.dropped_records, 1);
    }

    #[test]
    fn encoded_list_decodes_to_same_records() {
        let records = vec![
            AchievementRecord::new("🎤", "2024.01", "Live", "Line one\nLine two"),
            AchievementRecord::new("", "2023.12", "Debut", ""),
        ];
        let encoded = encode_achievements(&records).expect("encode");
        let decoded = decode_achievements(&encoded, AchievementCategory::Personal);
        assert_eq!(decoded.value, records);
        assert!(decoded.is_lossless());
    }
}
