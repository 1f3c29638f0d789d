// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::apply_security_pipeline,
    models::{AdminUserRequest, LoginRequest, TokenResponse, UserRequest, UserResponse},
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod oauth;
pub mod users;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route(
            "/usuarios",
            post(users::create_user).get(users::find_user_by_email),
        )
        .route(
            "/usuarios/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/admin/usuarios", post(users::create_user_by_admin))
        .route("/me", get(users::me))
        .route("/login", get(oauth::login_options))
        .route("/oauth2/authorization/{provider}", get(oauth::authorize))
        .route("/login/oauth2/code/{provider}", get(oauth::callback))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state.clone())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // CORS sits outermost so preflight requests never reach the auth gate.
    apply_security_pipeline(routes, state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        users::create_user,
        users::create_user_by_admin,
        users::find_user_by_email,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::me,
        oauth::login_options,
        oauth::authorize,
        oauth::callback,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginRequest,
            TokenResponse,
            UserRequest,
            AdminUserRequest,
            UserResponse,
            users::MeResponse,
            oauth::LoginOptions,
            oauth::ProviderLink,
            health::HealthResponse,
            health::ReadyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Password login"),
        (name = "Login", description = "Federated login"),
        (name = "Users", description = "User registration and management"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;
