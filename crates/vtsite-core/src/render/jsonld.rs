//! JSON-LD `Person` structured data for the home page.

use crate::settings::SiteConfig;
use serde_json::{Value, json};

/// Build the `Person` object. Empty social URLs are left out of `sameAs`.
pub fn person_json_ld(config: &SiteConfig) -> Value {
    let same_as: Vec<&str> = config.filled_socials().map(|s| s.url.as_str()).collect();
    json!({
        "@context": "https://schema.org",
        "@type": "Person",
        "name": config.vtuber_name,
        "description": config.tagline,
        "url": config.site_url,
        "sameAs": same_as,
    })
}

/// The `<script type="application/ld+json">` element.
///
/// `</` is written as `<\/` so a value cannot close the script element.
pub fn person_script_tag(config: &SiteConfig) -> String {
    let body = person_json_ld(config).to_string().replace("</", "<\\/");
    format!("<script type=\"application/ld+json\">{body}</script>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn config_with(settings: &Settings) -> SiteConfig {
        SiteConfig::load(settings).expect("load").0
    }

    #[test]
    fn same_as_omits_empty_profiles() {
        let mut settings = Settings::in_memory();
        settings.set("youtube_url", "https://youtube.com/@rin").expect("set");
        settings.set("instagram_url", "https://instagram.com/rin").expect("set");

        let ld = person_json_ld(&config_with(&settings));
        assert_eq!(ld["@type"], "Person");
        assert_eq!(ld["name"], "Hoshimiya Rin");
        assert_eq!(
            ld["sameAs"],
            json!(["https://youtube.com/@rin", "https://instagram.com/rin"])
        );
    }

    #[test]
    fn script_tag_cannot_be_closed_early() {
        let mut config = config_with(&Settings::in_memory());
        config.tagline = "a </script> b".to_string();
        let tag = person_script_tag(&config);
        assert_eq!(tag.matches("</script>").count(), 1);
        assert!(tag.contains("a <\\/script> b"));
    }
}
