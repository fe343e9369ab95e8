//! # Anti-forgery Tokens
//!
//! Stateless, time-windowed tokens for form posts. A token is a keyed BLAKE3
//! hash of the action name and the current half-lifetime tick, so a token is
//! accepted for between one and two half-lives after it is issued.

use crate::primitives::{NONCE_LIFETIME_SECS, NONCE_TOKEN_CHARS};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use subtle::ConstantTimeEq;

const KEY_CONTEXT: &str = "vtsite 2024-01 form nonce key";

/// Secret key for issuing and checking tokens.
#[derive(Clone)]
pub struct NonceKey {
    key: [u8; 32],
}

impl std::fmt::Debug for NonceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceKey").finish_non_exhaustive()
    }
}

impl NonceKey {
    /// Derive a key from an operator-supplied secret.
    #[must_use]
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret),
        }
    }

    fn tick(now_secs: u64) -> u64 {
        now_secs / (NONCE_LIFETIME_SECS / 2)
    }

    fn token_for(&self, action: &str, tick: u64) -> String {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(action.as_bytes());
        hasher.update(b"|");
        hasher.update(&tick.to_be_bytes());
        let digest = hasher.finalize();
        let mut token = URL_SAFE_NO_PAD.encode(digest.as_bytes());
        token.truncate(NONCE_TOKEN_CHARS);
        token
    }

    /// Token for `action`, valid from `now_secs`.
    #[must_use]
    pub fn issue(&self, action: &str, now_secs: u64) -> String {
        self.token_for(action, Self::tick(now_secs))
    }

    /// Whether `token` was issued for `action` in the current or previous tick.
    #[must_use]
    pub fn verify(&self, action: &str, token: &str, now_secs: u64) -> bool {
        let tick = Self::tick(now_secs);
        let candidates = [Some(tick), tick.checked_sub(1)];
        let mut valid = false;
        for candidate in candidates.into_iter().flatten() {
            let expected = self.token_for(action, candidate);
            // Same length or ct_eq short-circuits to false.
            valid |= bool::from(expected.as_bytes().ct_eq(token.as_bytes()));
        }
        valid
    }
}
