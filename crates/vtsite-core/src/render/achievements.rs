//! Achievement rows: fallback sets, blank filtering, year grouping and the
//! two list renderings (flat on the home page, grouped on its own page).

use super::{escape_html, nl2br};
use crate::primitives::{UNDATED_BUCKET, YEAR_PREFIX_CHARS};
use crate::{AchievementCategory, AchievementRecord, IconVocabulary};

/// Shown while the personal list is empty.
const PERSONAL_FALLBACK: [(&str, &str, &str, &str); 4] = [
    ("✨", "2023.06", "Debut stream", "First live stream as a virtual singer."),
    ("🎤", "2023.09", "First original song", "Released the first original song."),
    ("🎉", "2023.12", "10,000 subscribers", "Reached 10,000 channel subscribers."),
    ("📺", "2024.02", "24-hour stream", "Held a 24-hour charity stream."),
];

/// Shown while the business list is empty.
const BUSINESS_FALLBACK: [(&str, &str, &str, &str); 3] = [
    ("🤝", "2023.10", "Brand collaboration", "Collaboration stream with a game publisher."),
    ("🛍️", "2024.01", "First merchandise", "Launched acrylic stands and voice packs."),
    ("📢", "2024.03", "Event appearance", "Guest appearance at a VTuber showcase event."),
];

/// The hardcoded list rendered when a category has no records.
#[must_use]
pub fn fallback_records(category: AchievementCategory) -> Vec<AchievementRecord> {
    let rows: &[(&str, &str, &str, &str)] = match category {
        AchievementCategory::Personal => &PERSONAL_FALLBACK,
        AchievementCategory::Business => &BUSINESS_FALLBACK,
    };
    rows.iter()
        .map(|&(icon, date, title, description)| {
            AchievementRecord::new(icon, date, title, description)
        })
        .collect()
}

/// A record ready for display: icon resolved, blank records removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementRow<'a> {
    pub icon: &'a str,
    /// Spoken name of the icon, when it is in the category's vocabulary.
    pub icon_label: Option<&'static str>,
    pub date: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

impl AchievementRow<'_> {
    /// Bucket label: the first four characters of the date.
    #[must_use]
    pub fn year(&self) -> String {
        let date = self.date.trim();
        if date.is_empty() {
            UNDATED_BUCKET.to_string()
        } else {
            date.chars().take(YEAR_PREFIX_CHARS).collect()
        }
    }
}

/// Rows to display for `records`.
///
/// An empty list is replaced by the category's fallback set (returned as
/// owned records in `fallback`, which the rows borrow from).
pub fn display_rows<'a>(
    records: &'a [AchievementRecord],
    fallback: &'a [AchievementRecord],
    category: AchievementCategory,
) -> Vec<AchievementRow<'a>> {
    let source = if records.is_empty() { fallback } else { records };
    let vocabulary = IconVocabulary::for_category(category);
    source
        .iter()
        .filter(|r| !r.is_blank())
        .map(|r| {
            let icon = if r.icon.is_empty() {
                category.default_icon()
            } else {
                r.icon.as_str()
            };
            AchievementRow {
                icon,
                icon_label: vocabulary.label(icon),
                date: &r.date,
                title: &r.title,
                description: &r.description,
            }
        })
        .collect()
}

/// Rows sharing a year prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroup<'a> {
    pub year: String,
    pub rows: Vec<AchievementRow<'a>>,
}

/// Bucket rows by year. Buckets come newest first; rows keep list order
/// inside a bucket. The undated bucket sorts last.
pub fn group_by_year<'a>(rows: Vec<AchievementRow<'a>>) -> Vec<YearGroup<'a>> {
    let mut groups: Vec<YearGroup<'a>> = Vec::new();
    for row in rows {
        let year = row.year();
        match groups.iter_mut().find(|g| g.year == year) {
            Some(group) => group.rows.push(row),
            None => groups.push(YearGroup {
                year,
                rows: vec![row],
            }),
        }
    }
    groups.sort_by(|a, b| {
        let a_undated = a.year == UNDATED_BUCKET;
        let b_undated = b.year == UNDATED_BUCKET;
        a_undated.cmp(&b_undated).then_with(|| b.year.cmp(&a.year))
    });
    groups
}

fn render_row(out: &mut String, row: &AchievementRow<'_>) {
    out.push_str("<li class=\"achievement-item fade-in\">");
    match row.icon_label {
        Some(label) => out.push_str(&format!(
            "<span class=\"achievement-icon\" role=\"img\" aria-label=\"{}\">{}</span>",
            escape_html(label),
            escape_html(row.icon)
        )),
        None => out.push_str(&format!(
            "<span class=\"achievement-icon\" aria-hidden=\"true\">{}</span>",
            escape_html(row.icon)
        )),
    }
    out.push_str("<div class=\"achievement-body\">");
    if !row.date.is_empty() {
        out.push_str(&format!(
            "<time class=\"achievement-date\">{}</time>",
            escape_html(row.date)
        ));
    }
    if !row.title.is_empty() {
        out.push_str(&format!(
            "<h4 class=\"achievement-title\">{}</h4>",
            escape_html(row.title)
        ));
    }
    if !row.description.is_empty() {
        out.push_str(&format!(
            "<p class=\"achievement-description\">{}</p>",
            nl2br(row.description)
        ));
    }
    out.push_str("</div></li>");
}

/// Flat list, as on the home page.
pub fn render_list(records: &[AchievementRecord], category: AchievementCategory) -> String {
    let fallback = fallback_records(category);
    let rows = display_rows(records, &fallback, category);

    let mut out = format!(
        "<ul class=\"achievement-list achievement-list--{}\">",
        category.as_str()
    );
    for row in &rows {
        render_row(&mut out, row);
    }
    out.push_str("</ul>");
    out
}

/// Collapsible per-year sections, newest year open.
pub fn render_grouped(records: &[AchievementRecord], category: AchievementCategory) -> String {
    let fallback = fallback_records(category);
    let groups = group_by_year(display_rows(records, &fallback, category));

    let mut out = format!(
        "<div class=\"achievement-years achievement-years--{}\">",
        category.as_str()
    );
    for (i, group) in groups.iter().enumerate() {
        out.push_str(&format!(
            "<details class=\"achievement-year\"{}><summary>{} <span class=\"count\">({})</span></summary><ul class=\"achievement-list\">",
            if i == 0 { " open" } else { "" },
            escape_html(&group.year),
            group.rows.len()
        ));
        for row in &group.rows {
            render_row(&mut out, row);
        }
        out.push_str("</ul></details>");
    }
    out.push_str("</div>");
    out
}
