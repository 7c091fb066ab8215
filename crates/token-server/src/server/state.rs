//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use cryptor::{KeyMaterial, TokenCodec};

/// Default upper bound for `ttl_secs` on `POST /tokens` (30 days).
pub const DEFAULT_MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Application state shared across all request handlers.
///
/// The codec is immutable after construction, so handlers share it through an
/// `Arc` without locking.
#[derive(Clone)]
pub struct AppState {
    /// Token codec keyed with the configured key material.
    pub codec: Arc<TokenCodec>,
    /// Largest `ttl_secs` accepted on issue.
    pub max_ttl_secs: u64,
}

impl AppState {
    /// Create a new [`AppState`] from key material and the TTL limit.
    pub fn new(keys: &KeyMaterial, max_ttl_secs: u64) -> Self {
        Self {
            codec: Arc::new(TokenCodec::new(keys)),
            max_ttl_secs,
        }
    }
}

impl Default for AppState {
    /// Creates an [`AppState`] on placeholder keys, suitable for tests.
    fn default() -> Self {
        Self::new(&KeyMaterial::placeholder(), DEFAULT_MAX_TTL_SECS)
    }
}
