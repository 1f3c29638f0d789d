// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authentication context.
//!
//! The pipeline in `middleware.rs` installs the context; these extractors
//! only read it:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(ctx): Auth) -> impl IntoResponse {
//!     // ctx is AuthenticationContext
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{roles::ADMIN_ROLE, AuthError, AuthenticationContext};

/// Extractor for authenticated requests.
pub struct Auth(pub AuthenticationContext);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticationContext>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::AuthenticationRequired)
    }
}

/// Extractor that requires the `ADMIN` authority.
pub struct AdminOnly(pub AuthenticationContext);

impl<S: Send + Sync> FromRequestParts<S> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(ctx) = Auth::from_request_parts(parts, state).await?;

        if !ctx.has_authority(ADMIN_ROLE) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(ctx))
    }
}

/// Optional authentication extractor.
///
/// Yields `None` instead of rejecting, for public endpoints that show more
/// to signed-in callers.
pub struct OptionalAuth(pub Option<AuthenticationContext>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(
            parts.extensions.get::<AuthenticationContext>().cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use axum::http::Request;

    fn parts_with(ctx: Option<AuthenticationContext>) -> Parts {
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        if let Some(ctx) = ctx {
            parts.extensions.insert(ctx);
        }
        parts
    }

    fn context(roles: &[&str]) -> AuthenticationContext {
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        AuthenticationContext::local(User::new("a@b.com", "h", roles.clone()), roles)
    }

    #[tokio::test]
    async fn auth_requires_installed_context() {
        let mut parts = parts_with(None);
        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::AuthenticationRequired)));
    }

    #[tokio::test]
    async fn auth_returns_installed_context() {
        let mut parts = parts_with(Some(context(&["OPERADOR"])));
        let Auth(ctx) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.subject(), "a@b.com");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let mut parts = parts_with(Some(context(&["OPERADOR"])));
        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let mut parts = parts_with(Some(context(&["OPERADOR", "ADMIN"])));
        assert!(AdminOnly::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_context() {
        let mut parts = parts_with(None);
        let OptionalAuth(ctx) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(ctx.is_none());
    }
}
