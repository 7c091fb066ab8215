//! Opaque, tamper-evident, URL-safe string tokens.
//!
//! A token is the plaintext encrypted with AES-256-CBC under a random IV,
//! tagged with a salted HKDF-SHA3-224 over the ciphertext text, and flattened
//! into one URL-safe base64 string. Expiring tokens also bind a ten-digit unix
//! timestamp into the tag.
//!
//! # Token format
//!
//! ```text
//! enc( enc(ciphertext) "@" enc(iv) "#" enc(tag) "@" enc(salt) )
//! <10 digits> "d" enc( ... same as above, tag over envelope + digits ... )
//! ```
//!
//! # Invariants
//!
//! - The tag is verified before decryption is attempted.
//! - Key material never appears in `Debug` output, logs or error messages.
//! - The codec is a stateless transform; every call draws its own IV and salt.

pub mod cipher;
pub mod clock;
pub mod encoding;
pub mod hash;
pub mod keys;
pub mod token;

pub use cipher::{CipherEnvelope, CipherError, SymmetricCipher, KEY_LEN};
pub use clock::{Clock, SystemClock};
pub use encoding::EncodingError;
pub use hash::{KeyedHash, Tag};
pub use keys::KeyMaterial;
pub use token::{Expiring, TokenCodec, TokenError};
