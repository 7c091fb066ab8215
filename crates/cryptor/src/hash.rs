//! Salted keyed hash used as the token integrity tag.
//!
//! The tag is HKDF-SHA3-224 with the hash key as input keying material, a
//! random 16-byte salt, and the tagged input as the `info` parameter. Output
//! length equals the SHA3-224 digest size. Because the salt is fresh per call,
//! tagging the same input twice yields different values.

use hkdf::SimpleHkdf;
use rand::{rngs::OsRng, RngCore};
use sha3::Sha3_224;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::{split_pair, FIELD_DELIMITER};
use crate::encoding::{self, EncodingError};

/// Byte length of a tag value (224 bits).
pub const TAG_LEN: usize = 28;

/// Byte length of a tag salt (128 bits).
pub const SALT_LEN: usize = 16;

/// A tag value and the salt it was derived with.
///
/// The text representation is `<enc(value)>@<enc(salt)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Derived tag bytes.
    pub value: Vec<u8>,
    /// Salt bytes; not secret.
    pub salt: Vec<u8>,
}

impl Tag {
    /// Encode this tag to its text form.
    pub fn to_text(&self) -> String {
        format!(
            "{}{FIELD_DELIMITER}{}",
            encoding::encode(&self.value),
            encoding::encode(&self.salt),
        )
    }

    /// Parse the text form produced by [`Tag::to_text`].
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::InvalidAlphabet`] if the text does not split
    /// into two non-empty fields or either field fails to decode.
    pub fn from_text(text: &str) -> Result<Self, EncodingError> {
        let (value, salt) =
            split_pair(text, FIELD_DELIMITER).ok_or(EncodingError::InvalidAlphabet)?;
        Ok(Self {
            value: encoding::decode(value)?,
            salt: encoding::decode(salt)?,
        })
    }
}

/// Keyed, salted one-way function producing verifiable tags.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyedHash {
    key: Vec<u8>,
}

impl KeyedHash {
    /// Build a keyed hash from derivation key bytes of any length.
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    /// Tag `input` under a freshly generated salt.
    pub fn tag(&self, input: &[u8]) -> Tag {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Tag {
            value: self.derive(input, &salt).to_vec(),
            salt: salt.to_vec(),
        }
    }

    /// Check `value` against the tag recomputed from `input` and `salt`.
    ///
    /// Comparison is constant time. Any mismatch, including a `value` of the
    /// wrong length, returns `false`.
    pub fn verify(&self, input: &[u8], value: &[u8], salt: &[u8]) -> bool {
        let expected = self.derive(input, salt);
        expected.as_slice().ct_eq(value).into()
    }

    fn derive(&self, input: &[u8], salt: &[u8]) -> [u8; TAG_LEN] {
        let hk = SimpleHkdf::<Sha3_224>::new(Some(salt), &self.key);
        let mut okm = [0u8; TAG_LEN];
        // A single digest-length block is always a valid HKDF output length.
        if hk.expand(input, &mut okm).is_err() {
            okm.zeroize();
        }
        okm
    }
}

impl std::fmt::Debug for KeyedHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyedHash([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_has_expected_lengths() {
        let hash = KeyedHash::new(b"hash-key");
        let tag = hash.tag(b"input");
        assert_eq!(tag.value.len(), TAG_LEN);
        assert_eq!(tag.salt.len(), SALT_LEN);
    }

    #[test]
    fn tag_verifies() {
        let hash = KeyedHash::new(b"hash-key");
        let tag = hash.tag(b"input");
        assert!(hash.verify(b"input", &tag.value, &tag.salt));
    }

    #[test]
    fn same_input_yields_different_tags() {
        let hash = KeyedHash::new(b"hash-key");
        let a = hash.tag(b"input");
        let b = hash.tag(b"input");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.value, b.value);
    }

    #[test]
    fn derivation_is_deterministic_for_fixed_salt() {
        let hash = KeyedHash::new(b"hash-key");
        let salt = [9u8; SALT_LEN];
        assert_eq!(hash.derive(b"input", &salt), hash.derive(b"input", &salt));
    }

    #[test]
    fn rejects_modified_input() {
        let hash = KeyedHash::new(b"hash-key");
        let tag = hash.tag(b"input");
        assert!(!hash.verify(b"inpuT", &tag.value, &tag.salt));
    }

    #[test]
    fn rejects_modified_salt() {
        let hash = KeyedHash::new(b"hash-key");
        let mut tag = hash.tag(b"input");
        tag.salt[0] ^= 0x01;
        assert!(!hash.verify(b"input", &tag.value, &tag.salt));
    }

    #[test]
    fn rejects_truncated_value() {
        let hash = KeyedHash::new(b"hash-key");
        let tag = hash.tag(b"input");
        assert!(!hash.verify(b"input", &tag.value[..TAG_LEN - 1], &tag.salt));
        assert!(!hash.verify(b"input", &[], &tag.salt));
    }

    #[test]
    fn rejects_other_key() {
        let tag = KeyedHash::new(b"key-one").tag(b"input");
        assert!(!KeyedHash::new(b"key-two").verify(b"input", &tag.value, &tag.salt));
    }

    #[test]
    fn text_form_round_trip() {
        let tag = KeyedHash::new(b"hash-key").tag(b"input");
        let text = tag.to_text();
        assert_eq!(Tag::from_text(&text).unwrap(), tag);
    }

    #[test]
    fn from_text_rejects_wrong_field_count() {
        assert!(Tag::from_text("abcd").is_err());
        assert!(Tag::from_text("ab@cd@ef").is_err());
    }
}
