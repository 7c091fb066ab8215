//! [`KeyMaterial`]: the secret pair a [`TokenCodec`](crate::TokenCodec) is keyed with.
//!
//! # Security invariants
//!
//! - Key bytes are **never** logged or included in error messages; `Debug`
//!   prints `[REDACTED]`.
//! - Key bytes are zeroed when the value is dropped.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::{CipherError, KEY_LEN};

const PLACEHOLDER_CIPHER_PASSPHRASE: &str = "REPLACE_WITH_YOUR_OPENSSL_KEY";
const PLACEHOLDER_HASH_PASSPHRASE: &str = "REPLACE_WITH_YOUR_HKDF_KEY";

/// Cipher key and hash derivation key, held immutably.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    cipher_key: [u8; KEY_LEN],
    hash_key: Vec<u8>,
    #[zeroize(skip)]
    placeholder: bool,
}

impl KeyMaterial {
    /// Build key material from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `cipher_key` is not
    /// [`KEY_LEN`] bytes and [`CipherError::EmptyHashKey`] if `hash_key` is empty.
    pub fn new(cipher_key: &[u8], hash_key: &[u8]) -> Result<Self, CipherError> {
        let cipher_key: [u8; KEY_LEN] = cipher_key
            .try_into()
            .map_err(|_| CipherError::InvalidKeyLength)?;
        if hash_key.is_empty() {
            return Err(CipherError::EmptyHashKey);
        }
        Ok(Self {
            cipher_key,
            hash_key: hash_key.to_vec(),
            placeholder: false,
        })
    }

    /// Derive key material from two passphrases.
    ///
    /// The cipher key is the SHA-256 digest of `cipher_passphrase`; the hash key
    /// is `hash_passphrase` as-is.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EmptyHashKey`] if `hash_passphrase` is empty.
    pub fn from_passphrases(
        cipher_passphrase: &str,
        hash_passphrase: &str,
    ) -> Result<Self, CipherError> {
        let mut digest: [u8; KEY_LEN] = Sha256::digest(cipher_passphrase.as_bytes()).into();
        let keys = Self::new(&digest, hash_passphrase.as_bytes());
        digest.zeroize();
        keys
    }

    /// The built-in placeholder keys.
    ///
    /// Anyone with this source can forge and read tokens issued under them.
    /// Replace before production use.
    pub fn placeholder() -> Self {
        let digest: [u8; KEY_LEN] = Sha256::digest(PLACEHOLDER_CIPHER_PASSPHRASE.as_bytes()).into();
        Self {
            cipher_key: digest,
            hash_key: PLACEHOLDER_HASH_PASSPHRASE.as_bytes().to_vec(),
            placeholder: true,
        }
    }

    /// Returns `true` if this is the built-in placeholder pair.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub(crate) fn cipher_key(&self) -> &[u8; KEY_LEN] {
        &self.cipher_key
    }

    pub(crate) fn hash_key(&self) -> &[u8] {
        &self.hash_key
    }
}

impl Default for KeyMaterial {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.debug_struct("KeyMaterial")
            .field("keys", &"[REDACTED]")
            .field("placeholder", &self.placeholder)
            .finish()
    }
}
