// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Token issuance/verification, the per-request authentication pipeline,
//! the authorization policy and the federated-login bridge.
//!
//! ## Auth Flow
//!
//! 1. Client signs in (`POST /auth/login`) or completes a federated login
//! 2. Server returns an access token and a refresh token (HS256)
//! 3. Client sends `Authorization: Bearer <accessToken>`
//! 4. Pipeline verifies the token and installs an [`AuthenticationContext`]:
//!    - `sub` → local user (must still exist)
//!    - `roles` → granted authorities (as issued)
//! 5. Authorization policy admits or rejects the request
//!
//! ## Security
//!
//! - Signing key derived once at startup and shared by issuer and verifier
//! - Every authentication failure yields the same 401 body
//! - Expiry checked with millisecond precision

pub mod claims;
pub mod context;
pub mod error;
pub mod extractor;
pub mod login;
pub mod middleware;
pub mod oauth;
pub mod policy;
pub mod roles;
pub mod signing_key;
pub mod social;
pub mod token;

pub use claims::TokenClaims;
pub use context::{AuthenticationContext, FederatedPrincipal, Principal};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use oauth::{OAuthClient, OAuthError};
pub use policy::AuthorizationPolicy;
pub use signing_key::SigningKey;
pub use social::{FederatedIdentity, SocialLoginBridge, SocialLoginError};
pub use token::TokenProvider;
