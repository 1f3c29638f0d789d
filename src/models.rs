// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! The stored [`User`] record plus the request and response structures used
//! by the REST API. API types derive `ToSchema` for OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Users**: identity records and their registration payloads
//! - **Login**: credential submission and the issued token pair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// User Record
// =============================================================================

/// Identity record held by the credential store.
///
/// `password` holds the encoded hash once the record has been through the
/// account service; plaintext only exists on freshly built candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub roles: Vec<String>,
}

impl User {
    /// Build a candidate record with a fresh surrogate id.
    pub fn new(email: impl Into<String>, password: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password: password.into(),
            roles,
        }
    }
}

// =============================================================================
// User API Models
// =============================================================================

/// Registration / update payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserRequest {
    /// Account email (unique).
    pub email: String,
    /// Plaintext password.
    #[serde(alias = "senha")]
    pub password: String,
    /// Role names; the default role applies when omitted on self-registration.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserRequest {
    /// Field-level checks performed before anything reaches the account service.
    pub fn validate(&self) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err("email: required field".to_string());
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err("email: invalid format".to_string()),
        }
        if self.password.trim().is_empty() {
            return Err("password: required field".to_string());
        }
        Ok(())
    }

    pub fn into_user(self) -> User {
        User::new(self.email.trim(), self.password, self.roles)
    }
}

/// Administrator provisioning payload; the initial password is derived.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminUserRequest {
    pub email: String,
    pub roles: Vec<String>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            roles: user.roles,
        }
    }
}

// =============================================================================
// Login Models
// =============================================================================

/// Credentials submitted to `POST /auth/login`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    #[serde(alias = "senha")]
    pub password: String,
}

/// Token pair returned after a successful authentication.
///
/// Both tokens carry the same claims; the refresh token is only a second
/// signed artifact and grants the same privileges.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub email: String,
    pub authenticated: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub access_token: String,
    pub refresh_token: String,
}
