//! URL-safe text encoding for raw bytes.
//!
//! Uses the base64 alphabet with `+` replaced by `-` and `/` replaced by `_`.
//! Encoded output never carries `=` padding; decoding accepts input with or
//! without it. Neither `@` nor `#` belongs to the alphabet, which is what lets
//! the token layer use them as field delimiters.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use thiserror::Error;

/// URL-safe engine: no padding on encode, padding optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors produced by the encoding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The input contains characters outside the URL-safe alphabet, or is not a
    /// canonical encoding of any byte sequence.
    #[error("input is not valid url-safe base64")]
    InvalidAlphabet,
}

/// Encode `bytes` into the URL-safe alphabet without padding.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

/// Decode a URL-safe string produced by [`encode`].
///
/// # Errors
///
/// Returns [`EncodingError::InvalidAlphabet`] if `text` contains a character
/// outside the alphabet or has an impossible length.
pub fn decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    URL_SAFE_LENIENT
        .decode(text)
        .map_err(|_| EncodingError::InvalidAlphabet)
}
