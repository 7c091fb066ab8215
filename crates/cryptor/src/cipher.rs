//! AES-256-CBC encryption and decryption of token payloads.
//!
//! A fresh 128-bit IV is drawn from the OS CSPRNG for every call; the key is
//! reused across calls. CBC on its own provides no integrity, so callers must
//! authenticate the envelope before handing it to [`SymmetricCipher::decrypt`].

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::encoding::{self, EncodingError};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of a CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Separator between the ciphertext and IV fields of an envelope's text form.
pub const FIELD_DELIMITER: char = '@';

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Errors produced by the cipher layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The cipher key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid cipher key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// The hash derivation key is empty.
    #[error("hash key must not be empty")]
    EmptyHashKey,

    /// The envelope IV is not [`IV_LEN`] bytes.
    #[error("invalid iv length: expected {IV_LEN} bytes")]
    InvalidIvLength,

    /// The ciphertext is empty or not a whole number of blocks.
    #[error("ciphertext length is not a positive multiple of {BLOCK_LEN}")]
    InvalidLength,

    /// PKCS#7 padding was invalid after decryption.
    #[error("invalid padding")]
    BadPadding,

    /// The envelope text form could not be parsed.
    #[error("malformed envelope: {0}")]
    Encoding(#[from] EncodingError),
}

/// Ciphertext together with the IV it was produced under.
///
/// The text representation is `<enc(ciphertext)>@<enc(iv)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherEnvelope {
    /// Raw ciphertext bytes, a whole number of blocks.
    pub ciphertext: Vec<u8>,
    /// Raw IV bytes.
    pub iv: Vec<u8>,
}

impl CipherEnvelope {
    /// Encode this envelope to its text form.
    pub fn to_text(&self) -> String {
        format!(
            "{}{FIELD_DELIMITER}{}",
            encoding::encode(&self.ciphertext),
            encoding::encode(&self.iv),
        )
    }

    /// Parse the text form produced by [`CipherEnvelope::to_text`].
    ///
    /// Only the structure and alphabet are checked here; lengths are checked
    /// by [`SymmetricCipher::decrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Encoding`] if the text does not split into two
    /// non-empty fields or either field fails to decode.
    pub fn from_text(text: &str) -> Result<Self, CipherError> {
        let (ciphertext, iv) =
            split_pair(text, FIELD_DELIMITER).ok_or(EncodingError::InvalidAlphabet)?;
        Ok(Self {
            ciphertext: encoding::decode(ciphertext)?,
            iv: encoding::decode(iv)?,
        })
    }
}

/// Split `text` on `delimiter` into exactly two non-empty halves.
pub(crate) fn split_pair(text: &str, delimiter: char) -> Option<(&str, &str)> {
    let mut parts = text.split(delimiter);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => Some((a, b)),
        _ => None,
    }
}

/// AES-256-CBC with PKCS#7 padding under a fixed key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricCipher {
    key: [u8; KEY_LEN],
}

impl SymmetricCipher {
    /// Build a cipher from a 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| CipherError::InvalidKeyLength)?;
        Ok(Self { key })
    }

    /// Encrypt `plaintext` under a freshly generated IV.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if the block cipher rejects the
    /// key (unreachable for a key accepted by [`SymmetricCipher::new`]).
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<CipherEnvelope, CipherError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new_from_slices(&self.key, &iv)
            .map_err(|_| CipherError::InvalidKeyLength)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        Ok(CipherEnvelope {
            ciphertext,
            iv: iv.to_vec(),
        })
    }

    /// Decrypt an envelope back to plaintext bytes.
    ///
    /// Either the whole plaintext is returned or an error; no partial output.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidIvLength`] for an IV that is not
    /// [`IV_LEN`] bytes, [`CipherError::InvalidLength`] for a ciphertext that is
    /// empty or not block aligned, and [`CipherError::BadPadding`] if the
    /// decrypted padding is malformed.
    pub fn decrypt(&self, envelope: &CipherEnvelope) -> Result<Vec<u8>, CipherError> {
        if envelope.iv.len() != IV_LEN {
            return Err(CipherError::InvalidIvLength);
        }
        if envelope.ciphertext.is_empty() || envelope.ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CipherError::InvalidLength);
        }

        Aes256CbcDec::new_from_slices(&self.key, &envelope.iv)
            .map_err(|_| CipherError::InvalidKeyLength)?
            .decrypt_padded_vec_mut::<Pkcs7>(&envelope.ciphertext)
            .map_err(|_| CipherError::BadPadding)
    }
}

impl From<[u8; KEY_LEN]> for SymmetricCipher {
    fn from(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }
}

impl std::fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricCipher([REDACTED])")
    }
}
