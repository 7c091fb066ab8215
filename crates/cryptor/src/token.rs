//! [`TokenCodec`]: encrypt-then-tag token issue and verify-then-decrypt consume.
//!
//! # Wire format
//!
//! ```text
//! unbounded: enc( enc(ciphertext) "@" enc(iv) "#" enc(tag) "@" enc(salt) )
//! expiring:  <10 digits> "d" <unbounded format>
//! ```
//!
//! For expiring tokens the tag covers the envelope text followed by the
//! expiry digits, so the visible timestamp cannot be altered on its own.
//!
//! The tag check always runs before any decryption.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cipher::{split_pair, CipherEnvelope, CipherError, SymmetricCipher, FIELD_DELIMITER};
use crate::clock::{Clock, SystemClock};
use crate::encoding;
use crate::hash::{KeyedHash, Tag};
use crate::keys::KeyMaterial;

/// Separator between the envelope text and the tag text.
pub const TOKEN_DELIMITER: char = '#';

/// Separator between the expiry digits and the token body.
pub const EXPIRY_SEPARATOR: char = 'd';

/// Number of decimal digits in an expiry timestamp.
pub const EXPIRY_DIGITS: usize = 10;

/// Errors produced by the token layer.
///
/// Callers should treat [`TokenError::Format`] and [`TokenError::Integrity`]
/// identically and not reveal to the token holder which one occurred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token string is structurally malformed.
    #[error("malformed token: {0}")]
    Format(&'static str),

    /// The tag did not verify, or an authenticated envelope failed to decrypt.
    #[error("token integrity check failed")]
    Integrity,

    /// The caller passed an unusable argument (e.g. an expiry in the past).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The cipher primitive failed while issuing a token.
    #[error("cipher failure: {0}")]
    Cipher(#[from] CipherError),
}

/// Result of consuming an expiring token whose tag verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiring {
    /// The token is within its lifetime.
    Valid {
        /// Expiry as unix seconds.
        expires_at: u64,
        /// Decrypted payload.
        plaintext: String,
    },
    /// The token is authentic but its expiry has passed. It was not decrypted.
    Expired {
        /// Expiry as unix seconds.
        expires_at: u64,
    },
}

/// Issues and consumes URL-safe tokens under fixed key material.
///
/// Holds no mutable state; a single instance can be shared across threads.
pub struct TokenCodec<C = SystemClock> {
    cipher: SymmetricCipher,
    hash: KeyedHash,
    placeholder: bool,
    clock: C,
}

impl TokenCodec<SystemClock> {
    /// Build a codec that reads expiry against the system clock.
    pub fn new(keys: &KeyMaterial) -> Self {
        Self::with_clock(keys, SystemClock)
    }
}

impl<C: Clock> TokenCodec<C> {
    /// Build a codec with a custom [`Clock`].
    pub fn with_clock(keys: &KeyMaterial, clock: C) -> Self {
        Self {
            cipher: SymmetricCipher::from(*keys.cipher_key()),
            hash: KeyedHash::new(keys.hash_key()),
            placeholder: keys.is_placeholder(),
            clock,
        }
    }

    /// Returns `true` if the codec was built from placeholder keys.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Encrypt and tag `plaintext` into a token with no expiry.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Cipher`] if encryption fails.
    pub fn issue(&self, plaintext: &str) -> Result<String, TokenError> {
        self.seal(plaintext, None)
    }

    /// Verify and decrypt a token produced by [`TokenCodec::issue`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Format`] for a malformed token and
    /// [`TokenError::Integrity`] if the tag does not verify or the
    /// authenticated envelope cannot be decrypted.
    pub fn consume(&self, token: &str) -> Result<String, TokenError> {
        let envelope_text = self.authenticate(token, None)?;
        self.open(&envelope_text)
    }

    /// Encrypt and tag `plaintext` into a token that expires at `expires_at`
    /// (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidArgument`] if `expires_at` is not after the
    /// current time or does not have exactly [`EXPIRY_DIGITS`] decimal digits,
    /// and [`TokenError::Cipher`] if encryption fails.
    pub fn issue_with_expiry(&self, plaintext: &str, expires_at: u64) -> Result<String, TokenError> {
        self.issue_expiring(plaintext, expires_at, self.clock.now())
    }

    /// Like [`TokenCodec::issue_with_expiry`] with the expiry `ttl` from now.
    /// Returns the computed expiry alongside the token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidArgument`] for a TTL under one second or
    /// one that pushes the expiry past [`EXPIRY_DIGITS`] digits.
    pub fn issue_with_ttl(&self, plaintext: &str, ttl: Duration) -> Result<(u64, String), TokenError> {
        if ttl.as_secs() == 0 {
            return Err(TokenError::InvalidArgument("ttl must be at least one second"));
        }
        let now = self.clock.now();
        let expires_at = now.saturating_add(ttl.as_secs());
        let token = self.issue_expiring(plaintext, expires_at, now)?;
        Ok((expires_at, token))
    }

    /// Verify and, unless expired, decrypt a token produced by
    /// [`TokenCodec::issue_with_expiry`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Format`] for a malformed token (including a bad
    /// digit prefix) and [`TokenError::Integrity`] if the tag over the envelope
    /// and expiry does not verify.
    pub fn consume_with_expiry(&self, token: &str) -> Result<Expiring, TokenError> {
        let (digits, body) = split_expiry(token)?;
        let envelope_text = self.authenticate(body, Some(digits))?;
        let expires_at: u64 = digits
            .parse()
            .map_err(|_| TokenError::Format("expiry prefix is not a number"))?;

        if expires_at <= self.clock.now() {
            debug!(expires_at, "authentic token has expired");
            return Ok(Expiring::Expired { expires_at });
        }

        let plaintext = self.open(&envelope_text)?;
        Ok(Expiring::Valid {
            expires_at,
            plaintext,
        })
    }

    fn issue_expiring(&self, plaintext: &str, expires_at: u64, now: u64) -> Result<String, TokenError> {
        if expires_at <= now {
            return Err(TokenError::InvalidArgument("expiry must be in the future"));
        }
        let digits = expires_at.to_string();
        if digits.len() != EXPIRY_DIGITS {
            return Err(TokenError::InvalidArgument("expiry must be exactly 10 decimal digits"));
        }
        let body = self.seal(plaintext, Some(&digits))?;
        Ok(format!("{digits}{EXPIRY_SEPARATOR}{body}"))
    }

    fn seal(&self, plaintext: &str, expiry: Option<&str>) -> Result<String, TokenError> {
        let envelope_text = self.cipher.encrypt(plaintext.as_bytes())?.to_text();
        let tag = self.hash.tag(&tag_input(&envelope_text, expiry));
        Ok(encoding::encode(format!(
            "{envelope_text}{TOKEN_DELIMITER}{}",
            tag.to_text()
        )))
    }

    /// Decode the outer layer and verify the tag, returning the envelope text.
    fn authenticate(&self, body: &str, expiry: Option<&str>) -> Result<String, TokenError> {
        let decoded = encoding::decode(body)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| reject(TokenError::Format("outer layer is not url-safe base64 text")))?;

        let (envelope_text, tag_text) = split_pair(&decoded, TOKEN_DELIMITER)
            .ok_or_else(|| reject(TokenError::Format("expected envelope and tag")))?;
        if split_pair(envelope_text, FIELD_DELIMITER).is_none() {
            return Err(reject(TokenError::Format("expected ciphertext and iv")));
        }
        let tag = Tag::from_text(tag_text)
            .map_err(|_| reject(TokenError::Format("expected tag value and salt")))?;

        if !self
            .hash
            .verify(&tag_input(envelope_text, expiry), &tag.value, &tag.salt)
        {
            return Err(reject(TokenError::Integrity));
        }
        Ok(envelope_text.to_owned())
    }

    /// Decrypt an envelope whose tag has already verified.
    fn open(&self, envelope_text: &str) -> Result<String, TokenError> {
        let plaintext = CipherEnvelope::from_text(envelope_text)
            .and_then(|envelope| self.cipher.decrypt(&envelope))
            .map_err(|e| {
                warn!(error = %e, "authenticated token failed to decrypt; key mismatch?");
                TokenError::Integrity
            })?;
        String::from_utf8(plaintext).map_err(|_| {
            warn!("authenticated token decrypted to non-utf8 bytes");
            TokenError::Integrity
        })
    }
}

impl<C> std::fmt::Debug for TokenCodec<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("keys", &"[REDACTED]")
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

fn tag_input(envelope_text: &str, expiry: Option<&str>) -> Vec<u8> {
    let mut input = envelope_text.as_bytes().to_vec();
    if let Some(digits) = expiry {
        input.extend_from_slice(digits.as_bytes());
    }
    input
}

/// Split `<10 digits>d<body>`.
fn split_expiry(token: &str) -> Result<(&str, &str), TokenError> {
    let digits = token
        .get(..EXPIRY_DIGITS)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| reject(TokenError::Format("missing expiry prefix")))?;
    let body = token[EXPIRY_DIGITS..]
        .strip_prefix(EXPIRY_SEPARATOR)
        .ok_or_else(|| reject(TokenError::Format("missing expiry separator")))?;
    Ok((digits, body))
}

fn reject(err: TokenError) -> TokenError {
    debug!(error = %err, "token rejected");
    err
}
