// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication and authorization error type.
///
/// The variants are kept distinct for logging, but every authentication
/// failure renders the same public response so a caller cannot tell an
/// expired token from a forged one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token could not be parsed
    MalformedToken,
    /// Token signature does not match the signing key
    InvalidSignature,
    /// Token is past its expiry instant
    TokenExpired,
    /// Token subject has no local user record
    UnknownSubject,
    /// Email/password pair rejected
    BadCredentials,
    /// Request needs an authentication context and has none
    AuthenticationRequired,
    /// Authenticated, but missing a required authority
    InsufficientPermissions,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Specific error code, for server-side logging only.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::BadCredentials => "bad_credentials",
            AuthError::AuthenticationRequired => "authentication_required",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn public_body(&self) -> AuthErrorBody {
        let (error, error_code) = match self {
            AuthError::InsufficientPermissions => (
                "Insufficient permissions for this operation",
                "insufficient_permissions",
            ),
            AuthError::InternalError(_) => ("Internal authentication error", "internal_error"),
            _ => ("Not authenticated", "unauthenticated"),
        };
        AuthErrorBody {
            error: error.to_string(),
            error_code: error_code.to_string(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::UnknownSubject => write!(f, "Token subject is not a known user"),
            AuthError::BadCredentials => write!(f, "Invalid email or password"),
            AuthError::AuthenticationRequired => write!(f, "Authentication is required"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::InternalError(msg) = &self {
            tracing::error!(error = %msg, "Authentication backend failure");
        } else {
            tracing::debug!(reason = self.error_code(), "Request not authenticated");
        }
        (self.status_code(), Json(self.public_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn token_failures_share_one_public_response() {
        let expired = body_of(AuthError::TokenExpired).await;
        let forged = body_of(AuthError::InvalidSignature).await;
        let malformed = body_of(AuthError::MalformedToken).await;
        let unknown = body_of(AuthError::UnknownSubject).await;
        let missing = body_of(AuthError::AuthenticationRequired).await;

        assert_eq!(expired.0, StatusCode::UNAUTHORIZED);
        assert_eq!(expired, forged);
        assert_eq!(expired, malformed);
        assert_eq!(expired, unknown);
        assert_eq!(expired, missing);
        assert_eq!(expired.1["error_code"], "unauthenticated");
    }

    #[tokio::test]
    async fn insufficient_permissions_returns_403() {
        let (status, body) = body_of(AuthError::InsufficientPermissions).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "insufficient_permissions");
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let (status, body) = body_of(AuthError::InternalError("db down".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("db down"));
    }

    #[test]
    fn error_codes_stay_specific_for_logs() {
        assert_eq!(AuthError::TokenExpired.error_code(), "token_expired");
        assert_eq!(AuthError::InvalidSignature.error_code(), "invalid_signature");
    }
}
