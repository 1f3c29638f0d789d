// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance and verification.
//!
//! Tokens are compact JWS (HS256) carrying [`TokenClaims`]. Each successful
//! authentication yields an access token (with issuer) and a refresh token
//! (without issuer); both share roles, subject and validity window.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, Header, Validation};
use tracing::debug;

use super::{claims::TokenClaims, signing_key::SigningKey, AuthError, AuthenticationContext};
use crate::models::TokenResponse;
use crate::store::UserStore;

#[derive(Debug, Clone)]
pub struct TokenProvider {
    key: Arc<SigningKey>,
    validity: TimeDelta,
    issuer: String,
}

impl TokenProvider {
    /// # Arguments
    /// - `key`: the shared signing key (also handed to any other verifier)
    /// - `validity_ms`: `security.jwt.token.expire-length`
    /// - `issuer`: server origin stamped on access tokens
    pub fn new(key: Arc<SigningKey>, validity_ms: i64, issuer: impl Into<String>) -> Self {
        Self {
            key,
            validity: TimeDelta::milliseconds(validity_ms),
            issuer: issuer.into(),
        }
    }

    /// Mint the access/refresh pair for `email` with a snapshot of `roles`.
    pub fn issue(&self, email: &str, roles: &[String]) -> Result<TokenResponse, AuthError> {
        self.issue_at(email, roles, Utc::now())
    }

    pub fn issue_at(
        &self,
        email: &str,
        roles: &[String],
        now: DateTime<Utc>,
    ) -> Result<TokenResponse, AuthError> {
        // Claims carry millisecond precision; drop sub-millisecond noise so
        // the returned instants equal what is signed.
        let issued_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        let expires_at = issued_at
            .checked_add_signed(self.validity)
            .ok_or_else(|| AuthError::InternalError("token expiry out of range".to_string()))?;

        let access = TokenClaims {
            roles: roles.to_vec(),
            iat: issued_at.timestamp_millis(),
            exp: expires_at.timestamp_millis(),
            sub: email.to_string(),
            iss: Some(self.issuer.clone()),
        };
        let refresh = TokenClaims {
            roles: roles.to_vec(),
            iat: issued_at.timestamp_millis(),
            exp: expires_at.timestamp_millis(),
            sub: email.to_string(),
            iss: None,
        };

        Ok(TokenResponse {
            email: email.to_string(),
            authenticated: true,
            issued_at,
            expires_at,
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            self.key.encoding_key(),
        )
        .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    /// Check signature, structure and expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is in milliseconds; checked below instead of by the library.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<TokenClaims>(token, self.key.decoding_key(), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?
            .claims;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Resolve verified claims to an authentication context.
    ///
    /// The subject must still exist locally, but authorities come from the
    /// claims as issued: role changes apply from the next issuance on.
    pub fn resolve_principal(
        &self,
        claims: TokenClaims,
        store: &dyn UserStore,
    ) -> Result<AuthenticationContext, AuthError> {
        let user = store
            .find_by_email(&claims.sub)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .ok_or_else(|| {
                debug!("Token subject has no local user");
                AuthError::UnknownSubject
            })?;

        Ok(AuthenticationContext::local(user, claims.roles))
    }

    /// `verify` followed by `resolve_principal`.
    pub fn authenticate(
        &self,
        token: &str,
        store: &dyn UserStore,
    ) -> Result<AuthenticationContext, AuthError> {
        let claims = self.verify(token)?;
        self.resolve_principal(claims, store)
    }
}
