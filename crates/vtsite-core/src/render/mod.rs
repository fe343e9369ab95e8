//! # HTML Renderer
//!
//! Turns a [`crate::settings::SiteConfig`] into pages. Rendering is pure: the
//! same config and context always produce the same bytes.
//!
//! Every interpolated value goes through [`escape_html`] (or [`nl2br`], which
//! escapes first). Markup stored in a setting is shown as text.

pub mod achievements;
pub mod jsonld;
pub mod pages;

pub use achievements::{AchievementRow, YearGroup, display_rows, fallback_records, group_by_year};
pub use jsonld::person_json_ld;
pub use pages::{PageContext, achievements_page, home_page, not_found_page};

use crate::primitives::IMAGE_ASSET_BASE;

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape, then turn line breaks into `<br />`.
pub fn nl2br(text: &str) -> String {
    escape_html(&text.replace("\r\n", "\n")).replace('\n', "<br />\n")
}

/// `<picture>` with an AVIF source and PNG fallback for an image stem.
/// An empty stem renders nothing.
pub fn picture(stem: &str, alt: &str, class: &str) -> String {
    if stem.is_empty() {
        return String::new();
    }
    let stem = escape_html(stem);
    format!(
        "<picture class=\"{class}\">\
<source srcset=\"{base}/{stem}.avif\" type=\"image/avif\" />\
<img src=\"{base}/{stem}.png\" alt=\"{alt}\" loading=\"lazy\" data-hide-on-error />\
</picture>",
        class = escape_html(class),
        base = IMAGE_ASSET_BASE,
        alt = escape_html(alt),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_all_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn nl2br_escapes_before_breaking() {
        assert_eq!(nl2br("a<b>\r\nc"), "a&lt;b&gt;<br />\nc");
    }

    #[test]
    fn picture_has_avif_and_png() {
        let html = picture("hero", "Rin", "hero-image");
        assert!(html.contains("/assets/img/hero.avif"));
        assert!(html.contains("/assets/img/hero.png"));
        assert!(picture("", "Rin", "hero-image").is_empty());
    }
}
