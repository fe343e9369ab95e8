//! # Contact Form
//!
//! Validation and message composition for the single contact form.
//! Delivery is not done here: the app hands the [`OutgoingMail`] to a mailer.
//!
//! Every rejection carries a [`ContactRejection`] so the operator can see the
//! cause in the logs. The visitor only ever sees [`ContactStatus::Error`].

use crate::primitives::{MAX_CONTACT_FIELD_LENGTH, MAX_CONTACT_MESSAGE_LENGTH};
use crate::sanitize::{sanitize_text, sanitize_textarea};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw form submission, field names as posted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactForm {
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_subject: String,
    #[serde(default)]
    pub contact_message: String,
    /// Anti-forgery token.
    #[serde(default, rename = "contact_nonce")]
    pub token: String,
    /// Page to return to.
    #[serde(default)]
    pub redirect_to: String,
}

/// Outcome flag shown to the visitor after the redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Success,
    Error,
}

impl ContactStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Banner text for the page.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "Thank you! Your message has been sent.",
            Self::Error => "Sorry, your message could not be sent. Please check the form and try again.",
        }
    }
}

/// Why a submission was turned away. For logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactRejection {
    MissingField(&'static str),
    FieldTooLong(&'static str),
    InvalidEmail,
    BadToken,
    Disabled,
    NoRecipient,
}

impl fmt::Display for ContactRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(name) => write!(f, "missing field {name}"),
            Self::FieldTooLong(name) => write!(f, "field {name} too long"),
            Self::InvalidEmail => f.write_str("invalid sender email"),
            Self::BadToken => f.write_str("anti-forgery token rejected"),
            Self::Disabled => f.write_str("contact form disabled"),
            Self::NoRecipient => f.write_str("no recipient configured"),
        }
    }
}

/// A submission that passed validation, fields sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Plain-text mail ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

/// Basic address shape check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

impl ContactForm {
    /// Check presence, lengths and the sender address.
    pub fn validate(&self) -> Result<ValidContact, ContactRejection> {
        let fields = [
            ("contact_name", &self.contact_name, MAX_CONTACT_FIELD_LENGTH),
            ("contact_email", &self.contact_email, MAX_CONTACT_FIELD_LENGTH),
            ("contact_subject", &self.contact_subject, MAX_CONTACT_FIELD_LENGTH),
            ("contact_message", &self.contact_message, MAX_CONTACT_MESSAGE_LENGTH),
        ];
        for (name, value, max) in fields {
            if value.trim().is_empty() {
                return Err(ContactRejection::MissingField(name));
            }
            if value.chars().count() > max {
                return Err(ContactRejection::FieldTooLong(name));
            }
        }

        let email = self.contact_email.trim();
        if !is_valid_email(email) {
            return Err(ContactRejection::InvalidEmail);
        }

        let valid = ValidContact {
            name: sanitize_text(&self.contact_name),
            email: email.to_string(),
            subject: sanitize_text(&self.contact_subject),
            message: sanitize_textarea(&self.contact_message),
        };
        // Sanitizing can empty a field that was only markup.
        if valid.name.is_empty() {
            return Err(ContactRejection::MissingField("contact_name"));
        }
        if valid.subject.is_empty() {
            return Err(ContactRejection::MissingField("contact_subject"));
        }
        if valid.message.is_empty() {
            return Err(ContactRejection::MissingField("contact_message"));
        }
        Ok(valid)
    }
}

impl ValidContact {
    /// Compose the plain-text notification mail.
    #[must_use]
    pub fn compose(&self, recipient: &str, site_title: &str) -> OutgoingMail {
        // Header values must stay on one line.
        let subject = format!("[{}] {}", site_title, self.subject).replace(['\r', '\n'], " ");
        let body = format!(
            "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}\n",
            self.name, self.email, self.subject, self.message
        );
        OutgoingMail {
            to: recipient.to_string(),
            reply_to: format!("{} <{}>", self.name, self.email),
            subject,
            body,
        }
    }
}

/// `requested` if it is a same-site absolute path, else `/`.
/// The fragment is dropped.
pub fn local_path(requested: &str) -> &str {
    let requested = requested.trim();
    let path = if requested.starts_with('/')
        && !requested.starts_with("//")
        && !requested.contains('\\')
        && !requested.chars().any(char::is_control)
    {
        requested
    } else {
        "/"
    };
    path.split('#').next().unwrap_or("/")
}

/// Where to send the visitor after a submission.
///
/// Only same-site absolute paths are honoured; anything else returns to `/`.
/// Any existing `contact` flag and fragment are replaced.
pub fn redirect_target(requested: &str, status: ContactStatus) -> String {
    let path = local_path(requested);
    let (base, query) = match path.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (path, None),
    };

    let mut params: Vec<&str> = query
        .map(|q| {
            q.split('&')
                .filter(|p| !p.is_empty() && !p.starts_with("contact="))
                .collect()
        })
        .unwrap_or_default();
    let flag = format!("contact={}", status.as_str());
    params.push(&flag);

    format!("{}?{}#contact", base, params.join("&"))
}
