// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Federated login endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::form_urlencoded;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{
        oauth::STATE_TTL_MINUTES, FederatedIdentity, OAuthClient, OAuthError, SocialLoginBridge,
        SocialLoginError,
    },
    error::ApiError,
    state::AppState,
};

/// Login methods offered by this server.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginOptions {
    /// Endpoint accepting email and password.
    pub password_login: String,
    pub providers: Vec<ProviderLink>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderLink {
    pub name: String,
    pub authorization_url: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Cookie binding a login attempt to the browser that started it.
const STATE_COOKIE: &str = "oauth_state";
const CALLBACK_COOKIE_PATH: &str = "/login/oauth2/code";

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn state_cookie(state: &str, max_age_secs: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{STATE_COOKIE}={state}; Max-Age={max_age_secs}; Path={CALLBACK_COOKIE_PATH}; HttpOnly; SameSite=Lax{secure}"
    )
}

fn client_for<'a>(state: &'a AppState, provider: &str) -> Result<&'a OAuthClient, ApiError> {
    state
        .oauth
        .as_deref()
        .filter(|client| client.provider() == provider)
        .ok_or_else(|| ApiError::not_found("Unknown login provider"))
}

#[utoipa::path(
    get,
    path = "/login",
    tag = "Login",
    responses((status = 200, description = "Available login methods", body = LoginOptions))
)]
pub async fn login_options(State(state): State<AppState>) -> Json<LoginOptions> {
    let providers = state
        .oauth
        .iter()
        .map(|client| ProviderLink {
            name: client.provider().to_string(),
            authorization_url: format!("/oauth2/authorization/{}", client.provider()),
        })
        .collect();

    Json(LoginOptions {
        password_login: "/auth/login".to_string(),
        providers,
    })
}

/// Start a federated login by redirecting to the provider.
#[utoipa::path(
    get,
    path = "/oauth2/authorization/{provider}",
    tag = "Login",
    params(("provider" = String, Path, description = "Provider registration name")),
    responses(
        (status = 303, description = "Redirect to the provider; sets the state cookie"),
        (status = 404, description = "Unknown provider"),
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let client = client_for(&state, &provider)?;
    let request = client.begin();
    let cookie = state_cookie(
        &request.state,
        STATE_TTL_MINUTES * 60,
        client.https_callback(),
    );
    Ok(([(SET_COOKIE, cookie)], Redirect::to(request.url.as_str())))
}

/// Provider callback. On success redirects to the landing page with the
/// token pair in the URL fragment.
#[utoipa::path(
    get,
    path = "/login/oauth2/code/{provider}",
    tag = "Login",
    params(
        ("provider" = String, Path, description = "Provider registration name"),
        CallbackQuery
    ),
    responses(
        (status = 303, description = "Redirect to the landing page with tokens"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown provider"),
        (status = 502, description = "Provider unreachable"),
    )
)]
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let client = client_for(&state, &provider)?;

    if let Some(error) = query.error {
        return Err(oauth_failure(OAuthError::ProviderDenied(error)));
    }
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return Err(ApiError::unauthenticated());
    };

    let browser_state = parse_cookie(&headers, STATE_COOKIE);
    client
        .verify_callback_at(&oauth_state, browser_state.as_deref(), Utc::now())
        .map_err(oauth_failure)?;
    let access_token = client
        .exchange_code(&code, &oauth_state)
        .await
        .map_err(oauth_failure)?;
    let identity = client
        .fetch_identity(&access_token)
        .await
        .map_err(oauth_failure)?;

    let location = finish_login(&state, client, identity)?;
    let cleared = state_cookie("", 0, client.https_callback());
    Ok(([(SET_COOKIE, cleared)], Redirect::to(&location)))
}

/// Map the identity to a local session and build the landing URL.
pub fn finish_login(
    state: &AppState,
    client: &OAuthClient,
    identity: FederatedIdentity,
) -> Result<String, ApiError> {
    let bridge = SocialLoginBridge::new(
        state.store.as_ref(),
        state.encoder.as_ref(),
        client.auto_register(),
    );
    let ctx = bridge.complete(identity).map_err(|e| match e {
        SocialLoginError::UnknownUser(_) => ApiError::unauthenticated(),
        SocialLoginError::Account(e) => e.into(),
    })?;

    let tokens = state
        .tokens
        .issue(ctx.subject(), ctx.authorities())
        .map_err(|e| {
            warn!(error = %e, "Token issuance failed after federated login");
            ApiError::internal("Internal server error")
        })?;
    info!(user_id = %ctx.user().id, provider = %client.provider(), "Federated login completed");

    let fragment = form_urlencoded::Serializer::new(String::new())
        .append_pair("access_token", &tokens.access_token)
        .append_pair("refresh_token", &tokens.refresh_token)
        .append_pair("expires_at", &tokens.expires_at.to_rfc3339())
        .finish();
    Ok(format!("{}#{}", client.landing_url(), fragment))
}

fn oauth_failure(err: OAuthError) -> ApiError {
    warn!(error = %err, "Federated login failed");
    match err {
        OAuthError::Exchange(_) | OAuthError::UserInfo(_) => {
            ApiError::new(StatusCode::BAD_GATEWAY, "Login provider unavailable")
        }
        _ => ApiError::unauthenticated(),
    }
}
