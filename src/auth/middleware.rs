// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request authentication pipeline for Axum.
//!
//! Every request passes through three named stages in a fixed order:
//!
//! 1. [`FilterStage::BearerExtraction`]: pull the bearer token out of the
//!    `Authorization` header into a [`BearerToken`] extension
//! 2. [`FilterStage::TokenAuthentication`]: verify the token and install an
//!    [`AuthenticationContext`]. Never rejects; failures leave the request
//!    unauthenticated
//! 3. [`FilterStage::Authorization`]: the [`AuthorizationPolicy`](super::policy::AuthorizationPolicy)
//!    gate, which rejects protected requests that carry no context
//!
//! Stage 2 depends on stage 1 having run, and stage 3 on stage 2.
//! [`apply_security_pipeline`] is the only place the layers are attached.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};
use tracing::debug;

use super::AuthenticationContext;
use crate::state::AppState;

const BEARER_SCHEME: &str = "Bearer";

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    BearerExtraction,
    TokenAuthentication,
    Authorization,
}

impl FilterStage {
    /// Total order; the first entry sees the request first.
    pub const ORDER: [FilterStage; 3] = [
        FilterStage::BearerExtraction,
        FilterStage::TokenAuthentication,
        FilterStage::Authorization,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterStage::BearerExtraction => "bearer_extraction",
            FilterStage::TokenAuthentication => "token_authentication",
            FilterStage::Authorization => "authorization",
        }
    }
}

/// Raw bearer token found on the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

/// Token from `Authorization: Bearer <token>`, or `None` when the header is
/// missing, not valid UTF-8, uses another scheme, or has an empty token.
pub fn resolve_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    // Auth schemes are case-insensitive.
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Attach the pipeline stages to `router` in [`FilterStage::ORDER`].
pub fn apply_security_pipeline(router: Router, state: AppState) -> Router {
    // The layer added last runs first, so attach in reverse.
    FilterStage::ORDER
        .iter()
        .rev()
        .fold(router, |router, stage| match stage {
            FilterStage::BearerExtraction => router.layer(from_fn(extract_bearer)),
            FilterStage::TokenAuthentication => {
                router.layer(from_fn_with_state(state.clone(), authenticate_token))
            }
            FilterStage::Authorization => {
                router.layer(from_fn_with_state(state.clone(), authorize))
            }
        })
}

/// Stage 1.
pub async fn extract_bearer(mut request: Request, next: Next) -> Response {
    if let Some(token) = resolve_token(request.headers()) {
        request.extensions_mut().insert(BearerToken(token));
    }
    next.run(request).await
}

/// Stage 2. Uses the token stage 1 extracted, falling back to reading the
/// header itself.
pub async fn authenticate_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<AuthenticationContext>().is_none() {
        let token = request
            .extensions()
            .get::<BearerToken>()
            .map(|t| t.0.clone())
            .or_else(|| resolve_token(request.headers()));

        if let Some(token) = token {
            match state.tokens.authenticate(&token, state.store.as_ref()) {
                Ok(context) => {
                    request.extensions_mut().insert(context);
                }
                Err(e) => {
                    debug!(
                        stage = FilterStage::TokenAuthentication.name(),
                        reason = e.error_code(),
                        "Bearer token not accepted"
                    );
                }
            }
        }
    }
    next.run(request).await
}

/// Stage 3.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let decision = state.policy.check(
        request.method(),
        request.uri().path(),
        request.extensions().get::<AuthenticationContext>(),
    );
    match decision {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
