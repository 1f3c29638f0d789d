// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password login endpoint.

use axum::{extract::State, Json};

use crate::{
    auth::{login::sign_in, AuthError},
    models::{LoginRequest, TokenResponse},
    state::AppState,
};

/// Exchange email and password for an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    sign_in(
        state.store.as_ref(),
        state.encoder.as_ref(),
        &state.tokens,
        request.email.trim(),
        &request.password,
    )
    .map(Json)
}
