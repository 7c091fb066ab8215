//! Request and response types exchanged with the token service.
//!
//! All types are serialised as JSON over the HTTP API.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Issue endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /tokens`.
///
/// With neither `expires_at` nor `ttl_secs` the token never expires. Setting
/// both is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Text to protect.
    pub plaintext: String,
    /// Absolute expiry as ten-digit unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    /// Expiry relative to now, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

/// Successful response body for `POST /tokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueResponse {
    /// The URL-safe token.
    pub token: String,
    /// Expiry bound into the token, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// Consume endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /tokens/consume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeRequest {
    /// Token previously returned by `POST /tokens`.
    pub token: String,
    /// Whether the token was issued with an expiry.
    #[serde(default)]
    pub expiring: bool,
}

/// Outcome of consuming a token whose integrity verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// The token is authentic and within its lifetime.
    Valid,
    /// The token is authentic but its expiry has passed.
    Expired,
}

/// Successful response body for `POST /tokens/consume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeResponse {
    /// Whether the token is still usable.
    pub status: TokenStatus,
    /// Decrypted payload; absent for expired tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<String>,
    /// Expiry bound into the token, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        Self::new(err.code(), err.public_message())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the service is running on the built-in placeholder keys.
    pub placeholder_keys: bool,
}
