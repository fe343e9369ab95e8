//! # Property-Based Tests
//!
//! List encoding, sanitizing and rendering invariants checked with proptest.

use proptest::collection::vec;
use proptest::prelude::*;
use vtsite_core::render::achievements::{display_rows, group_by_year, render_grouped};
use vtsite_core::sanitize::{decode_achievements, encode_achievements, sanitize_text, sanitize_textarea};
use vtsite_core::{AchievementCategory, AchievementRecord, Settings, SiteConfig};

/// Field text that is already in sanitized form: printable, no markup,
/// single spaces, trimmed.
fn clean_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.,!?'&][A-Za-z0-9 .,!?'&]{0,30}[A-Za-z0-9.,!?'&]"
        .prop_map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn personal_icon() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("🎤".to_string()),
        Just("🎮".to_string()),
        Just("🏆".to_string()),
    ]
}

fn record() -> impl Strategy<Value = AchievementRecord> {
    (personal_icon(), "20[0-9]{2}\\.[01][0-9]", clean_text(), clean_text())
        .prop_map(|(icon, date, title, description)| {
            AchievementRecord::new(icon, date, title, description)
        })
}

proptest! {
    /// Encoding then decoding yields the identical ordered list.
    #[test]
    fn json_round_trip_preserves_order(records in vec(record(), 0..20)) {
        let encoded = encode_achievements(&records).expect("encode");
        let decoded = decode_achievements(&encoded, AchievementCategory::Personal);
        prop_assert!(decoded.is_lossless());
        prop_assert_eq!(decoded.value, records);
    }

    /// Saving the same list twice stores the same value and renders the same page.
    #[test]
    fn saving_twice_is_idempotent(records in vec(record(), 0..10)) {
        let encoded = encode_achievements(&records).expect("encode");
        let mut settings = Settings::in_memory();

        let first = settings.set("achievements_personal", &encoded).expect("set");
        let (config, _) = SiteConfig::load(&settings).expect("load");
        let first_html = render_grouped(&config.personal_achievements, AchievementCategory::Personal);

        let second = settings.set("achievements_personal", &encoded).expect("set");
        let (config, _) = SiteConfig::load(&settings).expect("load");
        let second_html = render_grouped(&config.personal_achievements, AchievementCategory::Personal);

        prop_assert_eq!(first.stored, second.stored);
        prop_assert_eq!(first_html, second_html);
    }

    /// Sanitizers are idempotent.
    #[test]
    fn sanitizers_are_idempotent(raw in ".{0,80}") {
        let once = sanitize_text(&raw);
        prop_assert_eq!(sanitize_text(&once), once.clone());
        let once = sanitize_textarea(&raw);
        prop_assert_eq!(sanitize_textarea(&once), once.clone());
    }

    /// Arbitrary input never fails to decode, and never yields more records
    /// than array elements.
    #[test]
    fn decoding_never_fails(raw in ".{0,200}") {
        let decoded = decode_achievements(&raw, AchievementCategory::Business);
        prop_assert!(decoded.value.len() <= raw.len());
    }

    /// Markup in any field never reaches the output unescaped.
    #[test]
    fn markup_is_always_escaped(payload in "[a-z]{1,8}") {
        let tag = format!("<x{payload} onerror=1>");
        let records = vec![AchievementRecord::new(tag.clone(), tag.clone(), tag.clone(), tag.clone())];
        let html = render_grouped(&records, AchievementCategory::Personal);
        prop_assert!(!html.contains(&tag));
    }

    /// Every displayed row lands in exactly one year bucket.
    #[test]
    fn grouping_partitions_rows(records in vec(record(), 1..30)) {
        let rows = display_rows(&records, &[], AchievementCategory::Personal);
        let total = rows.len();
        let groups = group_by_year(rows);
        prop_assert_eq!(groups.iter().map(|g| g.rows.len()).sum::<usize>(), total);
        for group in &groups {
            for row in &group.rows {
                prop_assert_eq!(&row.year(), &group.year);
            }
        }
    }
}

#[test]
fn same_year_shares_bucket() {
    let records = vec![
        AchievementRecord::new("", "2024.01", "a", ""),
        AchievementRecord::new("", "2024.05", "b", ""),
        AchievementRecord::new("", "2023.12", "c", ""),
    ];
    let groups = group_by_year(display_rows(&records, &[], AchievementCategory::Personal));
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].year, "2024");
    assert_eq!(groups[0].rows.len(), 2);
    assert_eq!(groups[1].year, "2023");
}
