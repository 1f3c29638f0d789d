// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed payload of access and refresh tokens.
///
/// `iat` and `exp` are epoch **milliseconds**, matching the unit of
/// `security.jwt.token.expire-length`. Expiry is therefore checked by
/// [`TokenProvider`](super::token::TokenProvider), not by the JWT library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Role names snapshotted at issuance
    pub roles: Vec<String>,

    /// Issued at (epoch ms)
    pub iat: i64,

    /// Expiration (epoch ms)
    pub exp: i64,

    /// Subject (user email)
    pub sub: String,

    /// Issuer (server origin). Present on access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl TokenClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.iat)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.exp)
    }

    /// Expired once `now` is past the expiry instant; `exp` itself is
    /// still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.exp
    }
}
