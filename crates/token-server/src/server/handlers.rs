//! Axum request handlers for all service endpoints.

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    ConsumeRequest, ConsumeResponse, ErrorResponse, HealthResponse, IssueRequest, IssueResponse,
    TokenStatus,
};
use common::ServiceError;
use cryptor::{Expiring, TokenError};
use tracing::{debug, error};

use super::state::AppState;

/// `POST /tokens` — encrypt and tag a plaintext into a token.
pub async fn issue(State(state): State<AppState>, Json(req): Json<IssueRequest>) -> Response {
    match issue_token(&state, &req) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /tokens/consume` — verify and decrypt a token.
///
/// Malformed and forged tokens produce the same `400 invalid_token` body.
pub async fn consume(State(state): State<AppState>, Json(req): Json<ConsumeRequest>) -> Response {
    match consume_token(&state, &req) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET /health` — liveness check.
///
/// Always `200 OK`; reports `"degraded"` while running on placeholder keys.
pub async fn health(State(state): State<AppState>) -> Response {
    let placeholder_keys = state.codec.is_placeholder();
    let status = if placeholder_keys { "degraded" } else { "ok" };
    let body = HealthResponse {
        status: status.into(),
        placeholder_keys,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn issue_token(state: &AppState, req: &IssueRequest) -> Result<IssueResponse, ServiceError> {
    let codec = &state.codec;
    match (req.expires_at, req.ttl_secs) {
        (None, None) => {
            let token = codec.issue(&req.plaintext).map_err(map_token_error)?;
            Ok(IssueResponse {
                token,
                expires_at: None,
            })
        }
        (Some(expires_at), None) => {
            let token = codec
                .issue_with_expiry(&req.plaintext, expires_at)
                .map_err(map_token_error)?;
            Ok(IssueResponse {
                token,
                expires_at: Some(expires_at),
            })
        }
        (None, Some(ttl_secs)) => {
            if ttl_secs > state.max_ttl_secs {
                return Err(ServiceError::BadRequest(format!(
                    "ttl_secs must not exceed {}",
                    state.max_ttl_secs
                )));
            }
            let (expires_at, token) = codec
                .issue_with_ttl(&req.plaintext, Duration::from_secs(ttl_secs))
                .map_err(map_token_error)?;
            Ok(IssueResponse {
                token,
                expires_at: Some(expires_at),
            })
        }
        (Some(_), Some(_)) => Err(ServiceError::BadRequest(
            "set at most one of expires_at and ttl_secs".into(),
        )),
    }
}

fn consume_token(state: &AppState, req: &ConsumeRequest) -> Result<ConsumeResponse, ServiceError> {
    if !req.expiring {
        let plaintext = state.codec.consume(&req.token).map_err(map_token_error)?;
        return Ok(ConsumeResponse {
            status: TokenStatus::Valid,
            plaintext: Some(plaintext),
            expires_at: None,
        });
    }

    match state
        .codec
        .consume_with_expiry(&req.token)
        .map_err(map_token_error)?
    {
        Expiring::Valid {
            expires_at,
            plaintext,
        } => Ok(ConsumeResponse {
            status: TokenStatus::Valid,
            plaintext: Some(plaintext),
            expires_at: Some(expires_at),
        }),
        Expiring::Expired { expires_at } => Ok(ConsumeResponse {
            status: TokenStatus::Expired,
            plaintext: None,
            expires_at: Some(expires_at),
        }),
    }
}

fn map_token_error(err: TokenError) -> ServiceError {
    match err {
        TokenError::Format(_) | TokenError::Integrity => {
            debug!(error = %err, "rejecting token");
            ServiceError::InvalidToken
        }
        TokenError::InvalidArgument(msg) => ServiceError::BadRequest(msg.into()),
        TokenError::Cipher(e) => ServiceError::Internal(e.to_string()),
    }
}

fn error_response(err: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (status, Json(ErrorResponse::from(err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use axum_test::TestServer;
    use cryptor::{Clock, KeyMaterial, TokenCodec};
    use serde_json::json;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    fn test_server() -> TestServer {
        TestServer::new(router::build(AppState::default())).unwrap()
    }

    async fn issue_ok(server: &TestServer, body: serde_json::Value) -> IssueResponse {
        let resp = server.post("/tokens").json(&body).await;
        resp.assert_status_ok();
        resp.json::<IssueResponse>()
    }

    #[tokio::test]
    async fn issue_then_consume_round_trip() {
        let server = test_server();
        let issued = issue_ok(&server, json!({"plaintext": "Hello World"})).await;
        assert!(issued.expires_at.is_none());

        let resp = server
            .post("/tokens/consume")
            .json(&json!({"token": issued.token}))
            .await;
        resp.assert_status_ok();
        let body = resp.json::<ConsumeResponse>();
        assert_eq!(body.status, TokenStatus::Valid);
        assert_eq!(body.plaintext.as_deref(), Some("Hello World"));
    }

    #[tokio::test]
    async fn ttl_token_round_trip() {
        let server = test_server();
        let issued = issue_ok(&server, json!({"plaintext": "link", "ttl_secs": 600})).await;
        let expires_at = issued.expires_at.unwrap();
        assert!(issued.token.starts_with(&format!("{expires_at}d")));

        let resp = server
            .post("/tokens/consume")
            .json(&json!({"token": issued.token, "expiring": true}))
            .await;
        resp.assert_status_ok();
        let body = resp.json::<ConsumeResponse>();
        assert_eq!(body.status, TokenStatus::Valid);
        assert_eq!(body.plaintext.as_deref(), Some("link"));
        assert_eq!(body.expires_at, Some(expires_at));
    }

    #[tokio::test]
    async fn expired_token_reports_expired_without_plaintext() {
        // Issued on the service's keys, against a clock far in the past.
        let codec = TokenCodec::with_clock(&KeyMaterial::placeholder(), FixedClock(1_000_000_000));
        let token = codec.issue_with_expiry("old", 1_000_000_100).unwrap();

        let resp = test_server()
            .post("/tokens/consume")
            .json(&json!({"token": token, "expiring": true}))
            .await;
        resp.assert_status_ok();
        let body = resp.json::<ConsumeResponse>();
        assert_eq!(body.status, TokenStatus::Expired);
        assert!(body.plaintext.is_none());
        assert_eq!(body.expires_at, Some(1_000_000_100));
    }

    #[tokio::test]
    async fn malformed_and_forged_tokens_look_identical() {
        let server = test_server();
        let issued = issue_ok(&server, json!({"plaintext": "secret"})).await;

        let other = TokenCodec::new(&KeyMaterial::from_passphrases("other", "keys").unwrap());
        let forged = other.issue("secret").unwrap();

        let mut bodies = Vec::new();
        for token in ["garbage!".to_owned(), forged, format!("{}x", issued.token)] {
            let resp = server
                .post("/tokens/consume")
                .json(&json!({"token": token}))
                .await;
            resp.assert_status(StatusCode::BAD_REQUEST);
            bodies.push(resp.text());
        }
        assert!(bodies.windows(2).all(|w| w[0] == w[1]), "{bodies:?}");
        assert!(bodies[0].contains("invalid_token"));
    }

    #[tokio::test]
    async fn rejects_both_expiry_fields() {
        let resp = test_server()
            .post("/tokens")
            .json(&json!({"plaintext": "x", "expires_at": 4_000_000_000u64, "ttl_secs": 60}))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(resp.json::<ErrorResponse>().code, "bad_request");
    }

    #[tokio::test]
    async fn rejects_past_expiry() {
        let resp = test_server()
            .post("/tokens")
            .json(&json!({"plaintext": "x", "expires_at": 1_000_000_000u64}))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(resp.json::<ErrorResponse>().code, "bad_request");
    }

    #[tokio::test]
    async fn rejects_ttl_above_limit() {
        let state = AppState::new(&KeyMaterial::placeholder(), 60);
        let server = TestServer::new(router::build(state)).unwrap();
        let resp = server
            .post("/tokens")
            .json(&json!({"plaintext": "x", "ttl_secs": 61}))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_placeholder_keys() {
        let resp = test_server().get("/health").await;
        resp.assert_status_ok();
        let body = resp.json::<HealthResponse>();
        assert_eq!(body.status, "degraded");
        assert!(body.placeholder_keys);
    }

    #[tokio::test]
    async fn health_ok_with_real_keys() {
        let keys = KeyMaterial::new(&[3u8; 32], b"hkdf-key").unwrap();
        let server = TestServer::new(router::build(AppState::new(&keys, 60))).unwrap();
        let body = server.get("/health").await.json::<HealthResponse>();
        assert_eq!(body.status, "ok");
    }

    #[test]
    fn cipher_failures_are_internal() {
        let err = map_token_error(TokenError::Cipher(cryptor::CipherError::InvalidKeyLength));
        assert_eq!(err.http_status(), 500);
    }
}
