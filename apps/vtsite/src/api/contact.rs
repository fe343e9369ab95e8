//! # Contact Handler
//!
//! `POST /contact`. Every outcome is a `303 See Other` back to the page the
//! form was on, flagged `contact=success` or `contact=error`. The visitor
//! never learns why a submission failed; the operator finds the reason in
//! the `contact_rejected` / `contact_failed` log events.

use super::{AppState, now_secs};
use crate::mail::MailError;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use std::fmt;
use vtsite_core::contact::{is_valid_email, redirect_target};
use vtsite_core::primitives::CONTACT_NONCE_ACTION;
use vtsite_core::{ContactForm, ContactRejection, ContactStatus, OutgoingMail, SiteError};

/// Why a submission did not produce a mail.
#[derive(Debug)]
enum ContactFailure {
    /// The submission itself was refused.
    Rejected(ContactRejection),
    /// Settings could not be read.
    Settings(SiteError),
    /// The mailer refused or failed.
    Delivery(MailError),
}

impl fmt::Display for ContactFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(r) => write!(f, "{r}"),
            Self::Settings(e) => write!(f, "settings unavailable: {e}"),
            Self::Delivery(e) => write!(f, "delivery failed: {e}"),
        }
    }
}

impl From<ContactRejection> for ContactFailure {
    fn from(r: ContactRejection) -> Self {
        Self::Rejected(r)
    }
}

impl From<SiteError> for ContactFailure {
    fn from(e: SiteError) -> Self {
        Self::Settings(e)
    }
}

/// Recipient from settings, else the configured fallback.
fn pick_recipient(configured: &str, fallback: Option<&str>) -> Option<String> {
    let configured = configured.trim();
    if is_valid_email(configured) {
        return Some(configured.to_string());
    }
    fallback
        .map(str::trim)
        .filter(|r| is_valid_email(r))
        .map(str::to_string)
}

/// Validate the submission and compose the mail.
async fn prepare(state: &AppState, form: &ContactForm) -> Result<OutgoingMail, ContactFailure> {
    if !state
        .nonce
        .verify(CONTACT_NONCE_ACTION, form.token.trim(), now_secs())
    {
        return Err(ContactRejection::BadToken.into());
    }

    let (enabled, configured, site_title) = {
        let settings = state.settings.read().await;
        (
            settings.flag("contact_enabled")?,
            settings.text("contact_recipient")?,
            settings.text("site_title")?,
        )
    };
    if !enabled {
        return Err(ContactRejection::Disabled.into());
    }
    let recipient = pick_recipient(&configured, state.fallback_recipient.as_deref())
        .ok_or(ContactRejection::NoRecipient)?;

    let valid = form.validate()?;
    Ok(valid.compose(&recipient, &site_title))
}

async fn deliver(state: &AppState, mail: OutgoingMail) -> Result<(), ContactFailure> {
    let mailer = state.mailer.clone();
    tokio::task::spawn_blocking(move || mailer.send(&mail))
        .await
        .map_err(|e| ContactFailure::Delivery(MailError::Spool(format!("mail task failed: {e}"))))?
        .map_err(ContactFailure::Delivery)
}

/// `POST /contact`
pub async fn contact_handler(
    State(state): State<AppState>,
    form: Result<Form<ContactForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!(
                event = "contact_rejected",
                reason = "unreadable_form",
                error = %rejection,
                "Contact submission could not be parsed"
            );
            return Redirect::to(&redirect_target("/", ContactStatus::Error)).into_response();
        }
    };

    let outcome = match prepare(&state, &form).await {
        Ok(mail) => deliver(&state, mail).await,
        Err(failure) => Err(failure),
    };

    let status = match outcome {
        Ok(()) => {
            tracing::info!(
                event = "contact_sent",
                mailer = state.mailer.name(),
                "Contact message accepted"
            );
            ContactStatus::Success
        }
        Err(ContactFailure::Rejected(rejection)) => {
            tracing::warn!(
                event = "contact_rejected",
                reason = %rejection,
                "Contact submission rejected"
            );
            ContactStatus::Error
        }
        Err(failure) => {
            tracing::error!(
                event = "contact_failed",
                mailer = state.mailer.name(),
                error = %failure,
                "Contact message not delivered"
            );
            ContactStatus::Error
        }
    };

    Redirect::to(&redirect_target(&form.redirect_to, status)).into_response()
}

// =============================================================================
// TESTS
// =============================================================================
