// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! - [`TokenError`]: why a token string was rejected by the validator.
//! - [`IssueError`]: why the codec refused to sign a token.
//! - [`AuthError`]: request-boundary failures, rendered as JSON 401/403/5xx.

use axum::{
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Token validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a well-formed compact JWS, or claims that cannot be decoded
    #[error("Token is malformed: {0}")]
    Malformed(String),
    /// Signature does not match header and payload under the configured secret
    #[error("Token signature is invalid")]
    BadSignature,
    /// `now >= exp`
    #[error("Token expired at {expired_at} (epoch ms)")]
    Expired { expired_at: i64 },
    /// Foreign algorithm, foreign issuer, or a token used for the wrong purpose
    #[error("Token is not supported: {0}")]
    Unsupported(String),
}

impl TokenError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed_token",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired { .. } => "expired_token",
            TokenError::Unsupported(_) => "unsupported_token",
        }
    }

    /// Expired tokens are routine; everything else hints at tampering or a misconfigured client.
    pub fn is_expected(&self) -> bool {
        matches!(self, TokenError::Expired { .. })
    }
}

/// Token issuance failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueError {
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("token lifetime must be positive")]
    NonPositiveTtl,
    #[error("expiry overflows the timestamp range")]
    TimestampOverflow,
    #[error("claim `{0}` is reserved")]
    ReservedClaim(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Authentication / authorization error surfaced at the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token rejected by the validator
    #[error(transparent)]
    Token(#[from] TokenError),
    /// Subject does not resolve to a stored principal
    #[error("Principal not found")]
    PrincipalNotFound,
    /// Principal exists but is disabled
    #[error("Principal is disabled")]
    PrincipalDisabled,
    /// Username/password pair rejected at login
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// No identity reached a protected operation
    #[error("Authentication is required")]
    Unauthenticated,
    /// Identity present but lacks the required role
    #[error("Missing required role {required_role}")]
    Forbidden { required_role: String },
    /// Credential store failed or timed out
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),
    /// Internal error
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Token(e) => e.error_code(),
            AuthError::PrincipalNotFound => "principal_not_found",
            AuthError::PrincipalDisabled => "principal_disabled",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden { .. } => "forbidden",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Token(_)
            | AuthError::PrincipalNotFound
            | AuthError::PrincipalDisabled
            | AuthError::InvalidCredentials
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        if status == StatusCode::UNAUTHORIZED {
            (status, [(WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unauthenticated_returns_401_with_challenge() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "unauthenticated");
    }

    #[tokio::test]
    async fn forbidden_returns_403() {
        let response = AuthError::Forbidden {
            required_role: "ROLE_ADMIN".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn token_errors_keep_their_code() {
        let response = AuthError::from(TokenError::Expired { expired_at: 1 }).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "expired_token");
    }

    #[test]
    fn only_expiry_is_an_expected_failure() {
        assert!(TokenError::Expired { expired_at: 0 }.is_expected());
        assert!(!TokenError::BadSignature.is_expected());
        assert!(!TokenError::Malformed("x".into()).is_expected());
        assert!(!TokenError::Unsupported("x".into()).is_expected());
    }

    #[test]
    fn store_failures_map_to_503() {
        assert_eq!(
            AuthError::StoreUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
