//! # Mail Delivery
//!
//! Backends that take a composed [`OutgoingMail`] off the contact handler's
//! hands.
//!
//! - [`SpoolMailer`] writes one `.eml` file per message into a directory that
//!   a local MTA (or a cron job) drains.
//! - [`LogMailer`] only logs; useful while setting a site up.
//! - [`MemoryMailer`] keeps messages in memory for tests.

use crate::config::{MailBackend, MailConfig};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use vtsite_core::OutgoingMail;

/// Delivery failures.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail spool error: {0}")]
    Spool(String),

    #[error("mail rejected: {0}")]
    Rejected(String),
}

/// A delivery backend.
pub trait Mailer: Send + Sync {
    /// Hand off one message. Returning `Ok` means the message is queued.
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Build the configured backend.
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match config.backend {
        MailBackend::Spool => Arc::new(SpoolMailer::new(&config.spool_dir, &config.from)),
        MailBackend::Log => Arc::new(LogMailer),
    }
}

/// Header values must be a single line.
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

// =============================================================================
// SPOOL
// =============================================================================

/// Writes RFC 5322 style `.eml` files.
#[derive(Debug)]
pub struct SpoolMailer {
    dir: PathBuf,
    from: String,
    sequence: AtomicU64,
}

impl SpoolMailer {
    pub fn new(dir: &Path, from: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            from: from.to_string(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Full message text.
    pub fn render(&self, mail: &OutgoingMail) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nReply-To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
Content-Type: text/plain; charset=utf-8\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
            header_value(&self.from),
            header_value(&mail.to),
            header_value(&mail.reply_to),
            header_value(&mail.subject),
            mail.body.replace("\r\n", "\n").replace('\n', "\r\n"),
        )
    }
}

impl Mailer for SpoolMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if mail.to.trim().is_empty() {
            return Err(MailError::Rejected("no recipient".to_string()));
        }
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| MailError::Spool(format!("create {}: {}", self.dir.display(), e)))?;

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stem = format!("{}-{}-{}", secs, std::process::id(), seq);

        // Write under a temporary name so a reader never sees half a file.
        let partial = self.dir.join(format!("{stem}.tmp"));
        let finished = self.dir.join(format!("{stem}.eml"));
        std::fs::write(&partial, self.render(mail))
            .map_err(|e| MailError::Spool(format!("write {}: {}", partial.display(), e)))?;
        publish(&partial, &finished)?;

        tracing::debug!(file = %finished.display(), "Contact mail spooled");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "spool"
    }
}

/// Move a fully written spool file to its final name. The partial file is
/// removed when the move fails.
fn publish(partial: &Path, finished: &Path) -> Result<(), MailError> {
    if let Err(e) = std::fs::rename(partial, finished) {
        if let Err(cleanup) = std::fs::remove_file(partial) {
            tracing::warn!(file = %partial.display(), error = %cleanup, "Cannot remove partial spool file");
        }
        return Err(MailError::Spool(format!("rename {}: {}", finished.display(), e)));
    }
    Ok(())
}

// =============================================================================
// LOG
// =============================================================================

/// Logs messages instead of delivering them.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            event = "contact_mail",
            to = %mail.to,
            reply_to = %mail.reply_to,
            subject = %mail.subject,
            body_chars = mail.body.chars().count(),
            "Contact mail (log backend, not delivered)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Collects messages; optionally refuses every delivery.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every `send` fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Rejected("memory mailer set to fail".to_string()));
        }
        let mut sent = self
            .sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sent.push(mail.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// TESTS
// =============================================================================
