//! # Fixed Limits and Constants
//!
//! Hardcoded runtime constants for the site core. These are compiled into the
//! binary and are immutable at runtime.

/// Maximum number of records kept in one achievements list.
///
/// The sanitizer truncates longer lists; the editor refuses to grow past it.
pub const MAX_LIST_RECORDS: usize = 100;

/// Maximum length, in characters, of a single-line text field.
pub const MAX_TEXT_LENGTH: usize = 512;

/// Maximum length, in characters, of a multi-line text field.
pub const MAX_TEXTAREA_LENGTH: usize = 8192;

/// Maximum length of an image file stem.
pub const MAX_IMAGE_STEM_LENGTH: usize = 64;

/// Number of featured video slots. Always exactly this many.
pub const VIDEO_SLOTS: usize = 3;

/// Number of leading date characters that form the year bucket.
pub const YEAR_PREFIX_CHARS: usize = 4;

/// Bucket label for records without a date.
pub const UNDATED_BUCKET: &str = "—";

// =============================================================================
// CONTACT FORM
// =============================================================================

/// Maximum length of the contact message body.
pub const MAX_CONTACT_MESSAGE_LENGTH: usize = 5000;

/// Maximum length of the other contact fields.
pub const MAX_CONTACT_FIELD_LENGTH: usize = 200;

/// Anti-forgery action name for the contact form.
pub const CONTACT_NONCE_ACTION: &str = "vtsite_contact";

/// Anti-forgery token lifetime. A token is valid for one to two half-lives.
pub const NONCE_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Length of an issued token in characters.
pub const NONCE_TOKEN_CHARS: usize = 20;

// =============================================================================
// AUTOFILL
// =============================================================================

/// Timeout for one video metadata fetch.
pub const AUTOFILL_TIMEOUT_SECS: u64 = 15;

/// Title written to a slot when the metadata fetch fails.
pub const AUTOFILL_FAILURE_SENTINEL: &str = "(could not fetch title)";

// =============================================================================
// PRESENTATION
// =============================================================================

/// Name of the cookie persisting the visitor's theme choice.
pub const THEME_COOKIE: &str = "vtsite_theme";

/// Base path for theme images.
pub const IMAGE_ASSET_BASE: &str = "/assets/img";
