//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::InvalidToken`] → 400
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed or carried an unusable argument.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The presented token was rejected.
    ///
    /// Deliberately carries no detail: malformed and forged tokens must be
    /// indistinguishable to the caller.
    #[error("invalid token")]
    InvalidToken,

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::InvalidToken => 400,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::InvalidToken => "invalid_token",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// Description safe to expose to callers.
    ///
    /// Internal details are replaced by a generic message.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::BadRequest(msg) => msg.clone(),
            ServiceError::InvalidToken => "the token is invalid".into(),
            ServiceError::Internal(_) => "internal error".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::InvalidToken.http_status(), 400);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BadRequest("expiry must be in the future".into());
        assert!(e.to_string().contains("expiry must be in the future"));
    }

    #[test]
    fn internal_detail_is_not_public() {
        let e = ServiceError::Internal("aes key rejected".into());
        assert_eq!(e.code(), "internal_error");
        assert!(!e.public_message().contains("aes"));
    }
}
