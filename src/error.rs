// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::accounts::AccountError;
use crate::store::StorageError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    /// Same body the authentication pipeline renders for any 401.
    pub fn unauthenticated() -> Self {
        Self {
            code: Some("unauthenticated"),
            ..Self::new(StatusCode::UNAUTHORIZED, "Not authenticated")
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Same body the `AdminOnly` gate renders for a 403.
    pub fn forbidden() -> Self {
        Self {
            code: Some("insufficient_permissions"),
            ..Self::new(
                StatusCode::FORBIDDEN,
                "Insufficient permissions for this operation",
            )
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateRegistration(_) => ApiError::conflict("User already registered"),
            AccountError::MissingRoles => {
                ApiError::unprocessable("roles: at least one role is required")
            }
            AccountError::Storage(StorageError::NotFound(_)) => ApiError::not_found("User not found"),
            other => {
                tracing::error!(error = %other, "Account operation failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}
