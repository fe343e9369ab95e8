//! Typed, fully decoded view of the settings, handed to the renderer.

use super::Settings;
use crate::sanitize::Decoded;
use crate::{AchievementCategory, AchievementRecord, SiteError, VideoEntry};
use serde::Serialize;

/// Social profile keys in display (and `sameAs`) order.
const SOCIAL_KEYS: [(&str, &str); 5] = [
    ("youtube_url", "YouTube"),
    ("twitter_url", "X"),
    ("twitch_url", "Twitch"),
    ("tiktok_url", "TikTok"),
    ("instagram_url", "Instagram"),
];

/// One social profile link. `url` may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialLink {
    pub platform: &'static str,
    pub url: String,
}

/// A list setting that decoded with losses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub key: &'static str,
    pub dropped_fields: usize,
    pub dropped_records: usize,
    pub malformed: bool,
}

impl LoadWarning {
    fn from_decoded<T>(key: &'static str, decoded: &Decoded<T>) -> Option<Self> {
        (!decoded.is_lossless()).then_some(Self {
            key,
            dropped_fields: decoded.dropped_fields,
            dropped_records: decoded.dropped_records,
            malformed: decoded.malformed,
        })
    }
}

/// Everything a page needs, read once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteConfig {
    pub site_title: String,
    pub vtuber_name: String,
    pub tagline: String,
    pub about_text: String,
    pub site_url: String,
    pub hero_image: String,
    pub logo_image: String,
    pub socials: Vec<SocialLink>,
    pub contact_enabled: bool,
    pub contact_recipient: String,
    pub loading_screen_enabled: bool,
    pub personal_achievements: Vec<AchievementRecord>,
    pub business_achievements: Vec<AchievementRecord>,
    pub videos: Vec<VideoEntry>,
}

impl SiteConfig {
    /// Read and decode every setting.
    ///
    /// Lossy list decodes are not errors; they come back as warnings.
    pub fn load(settings: &Settings) -> Result<(Self, Vec<LoadWarning>), SiteError> {
        let mut warnings = Vec::new();

        let personal = settings.achievements(AchievementCategory::Personal)?;
        warnings.extend(LoadWarning::from_decoded(
            AchievementCategory::Personal.settings_key(),
            &personal,
        ));
        let business = settings.achievements(AchievementCategory::Business)?;
        warnings.extend(LoadWarning::from_decoded(
            AchievementCategory::Business.settings_key(),
            &business,
        ));
        let videos = settings.videos()?;
        warnings.extend(LoadWarning::from_decoded("featured_videos", &videos));

        let socials = SOCIAL_KEYS
            .iter()
            .map(|&(key, platform)| {
                Ok(SocialLink {
                    platform,
                    url: settings.text(key)?,
                })
            })
            .collect::<Result<Vec<_>, SiteError>>()?;

        let config = Self {
            site_title: settings.text("site_title")?,
            vtuber_name: settings.text("vtuber_name")?,
            tagline: settings.text("tagline")?,
            about_text: settings.text("about_text")?,
            site_url: settings.text("site_url")?,
            hero_image: settings.text("hero_image")?,
            logo_image: settings.text("logo_image")?,
            socials,
            contact_enabled: settings.flag("contact_enabled")?,
            contact_recipient: settings.text("contact_recipient")?,
            loading_screen_enabled: settings.flag("loading_screen_enabled")?,
            personal_achievements: personal.value,
            business_achievements: business.value,
            videos: videos.value,
        };
        Ok((config, warnings))
    }

    /// The achievements list of one category.
    #[must_use]
    pub fn achievements(&self, category: AchievementCategory) -> &[AchievementRecord] {
        match category {
            AchievementCategory::Personal => &self.personal_achievements,
            AchievementCategory::Business => &self.business_achievements,
        }
    }

    /// Social links that are actually filled in.
    pub fn filled_socials(&self) -> impl Iterator<Item = &SocialLink> {
        self.socials.iter().filter(|s| !s.url.is_empty())
    }
}
