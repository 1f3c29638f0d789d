// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    auth::{
        roles::{ADMIN_ROLE, DEFAULT_ROLE},
        AdminOnly, Auth, AuthenticationContext, OptionalAuth, Principal,
    },
    error::ApiError,
    models::{AdminUserRequest, User, UserRequest, UserResponse},
    state::AppState,
};

/// Response for GET /me
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    /// Subject of the session (the user's email).
    pub subject: String,
    /// Authorities granted to this session.
    pub authorities: Vec<String>,
    /// Federated provider, when the session came from a social login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl From<AuthenticationContext> for MeResponse {
    fn from(ctx: AuthenticationContext) -> Self {
        let provider = match ctx.principal() {
            Principal::Local(_) => None,
            Principal::Federated(federated) => Some(federated.provider.clone()),
        };
        Self {
            id: ctx.user().id,
            subject: ctx.subject().to_string(),
            authorities: ctx.authorities().to_vec(),
            provider,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    pub email: String,
}

fn is_admin(ctx: &AuthenticationContext) -> bool {
    ctx.has_authority(ADMIN_ROLE)
}

/// Callers may act on their own record; administrators on any.
fn ensure_self_or_admin(ctx: &AuthenticationContext, id: Uuid) -> Result<(), ApiError> {
    if ctx.user().id == id || is_admin(ctx) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

fn created(user: User) -> impl IntoResponse {
    let location = format!("/usuarios/{}", user.id);
    (
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(UserResponse::from(user)),
    )
}

/// Self-registration. Open to anonymous callers, who only ever get the
/// default role; any other role requires an administrator's token.
#[utoipa::path(
    post,
    path = "/usuarios",
    tag = "Users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 403, description = "Roles beyond the default need an administrator"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid payload"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Json(request): Json<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate().map_err(ApiError::unprocessable)?;
    let privileged = request.roles.iter().any(|role| role != DEFAULT_ROLE);
    if privileged && !caller.as_ref().is_some_and(is_admin) {
        tracing::warn!(roles = ?request.roles, "Self-registration asked for privileged roles");
        return Err(ApiError::forbidden());
    }

    let user = state.accounts().create(request.into_user())?;
    Ok(created(user))
}

/// Provision a user with the derived initial password. Requires `ADMIN`.
#[utoipa::path(
    post,
    path = "/admin/usuarios",
    tag = "Users",
    security(("bearer" = [])),
    request_body = AdminUserRequest,
    responses(
        (status = 201, description = "User provisioned", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an administrator"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid payload"),
    )
)]
pub async fn create_user_by_admin(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Json(request): Json<AdminUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::unprocessable("email: invalid format"));
    }
    let user = state
        .accounts()
        .create_by_admin(User::new(email, String::new(), request.roles))?;
    tracing::info!(admin = %admin.subject(), user_id = %user.id, "User provisioned by administrator");
    Ok(created(user))
}

/// Look a user up by email. Non-administrators may only look up themselves.
#[utoipa::path(
    get,
    path = "/usuarios",
    tag = "Users",
    security(("bearer" = [])),
    params(EmailQuery),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Another user's record"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn find_user_by_email(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = query.email.trim();
    if !is_admin(&ctx) && ctx.subject() != email {
        return Err(ApiError::forbidden());
    }
    state
        .accounts()
        .find_by_email(email)?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[utoipa::path(
    get,
    path = "/usuarios/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Another user's record"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    ensure_self_or_admin(&ctx, id)?;
    state
        .accounts()
        .find_by_id(id)?
        .map(|user| Json(user.into()))
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Replace a user's password and, when given, roles. The email is fixed and
/// only administrators may change roles.
#[utoipa::path(
    put,
    path = "/usuarios/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Another user's record, or a role change by a non-administrator"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Invalid payload"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(id): Path<Uuid>,
    Json(request): Json<UserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    ensure_self_or_admin(&ctx, id)?;
    request.validate().map_err(ApiError::unprocessable)?;

    let accounts = state.accounts();
    let existing = accounts
        .find_by_id(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    if !existing.email.eq_ignore_ascii_case(request.email.trim()) {
        return Err(ApiError::unprocessable("email: cannot be changed"));
    }

    let roles = if request.roles.is_empty() || request.roles == existing.roles {
        existing.roles
    } else if is_admin(&ctx) {
        request.roles
    } else {
        return Err(ApiError::forbidden());
    };
    let updated = accounts.update(User {
        id: existing.id,
        email: existing.email,
        password: request.password,
        roles,
    })?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/usuarios/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Another user's record"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ensure_self_or_admin(&ctx, id)?;
    let accounts = state.accounts();
    let user = accounts
        .find_by_id(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    accounts.delete(&user)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Identity and authorities of the current session.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current session", body = MeResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
pub async fn me(Auth(ctx): Auth) -> Json<MeResponse> {
    Json(ctx.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn me_response_from_local_context() {
        let user = User::new("ana@example.com", "h", vec!["OPERADOR".to_string()]);
        let id = user.id;
        let ctx = AuthenticationContext::local(user, vec!["OPERADOR".to_string()]);

        let response: MeResponse = ctx.into();
        assert_eq!(response.id, id);
        assert_eq!(response.subject, "ana@example.com");
        assert_eq!(response.authorities, vec!["OPERADOR".to_string()]);
        assert!(response.provider.is_none());
    }

    #[test]
    fn only_owner_or_admin_may_touch_a_record() {
        let owner = User::new("ana@example.com", "h", vec![DEFAULT_ROLE.to_string()]);
        let owner_id = owner.id;
        let ctx = AuthenticationContext::local(owner, vec![DEFAULT_ROLE.to_string()]);
        assert!(ensure_self_or_admin(&ctx, owner_id).is_ok());
        assert_eq!(
            ensure_self_or_admin(&ctx, Uuid::new_v4()).unwrap_err().status,
            StatusCode::FORBIDDEN
        );

        let admin = AuthenticationContext::local(
            User::new("root@example.com", "h", vec![ADMIN_ROLE.to_string()]),
            vec![ADMIN_ROLE.to_string()],
        );
        assert!(ensure_self_or_admin(&admin, owner_id).is_ok());
    }

    #[test]
    fn me_response_names_federated_provider() {
        let user = User::new("ana@example.com", "h", vec!["OPERADOR".to_string()]);
        let ctx = AuthenticationContext::federated(
            user,
            "google".to_string(),
            Map::new(),
            vec!["OPERADOR".to_string()],
        );

        let response: MeResponse = ctx.into();
        assert_eq!(response.provider.as_deref(), Some("google"));
    }
}
