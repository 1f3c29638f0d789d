// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password sign-in.

use tracing::{info, warn};

use super::{token::TokenProvider, AuthError};
use crate::models::TokenResponse;
use crate::password::{PasswordEncoder, DUMMY_HASH};
use crate::store::UserStore;

/// Check `email`/`password` and mint a token pair.
///
/// Unknown email and wrong password both yield `BadCredentials`, and both
/// pay for one password verification.
pub fn sign_in(
    store: &dyn UserStore,
    encoder: &dyn PasswordEncoder,
    tokens: &TokenProvider,
    email: &str,
    password: &str,
) -> Result<TokenResponse, AuthError> {
    let user = store
        .find_by_email(email)
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

    let Some(user) = user else {
        let _ = encoder.matches(password, DUMMY_HASH);
        warn!("Sign-in rejected");
        return Err(AuthError::BadCredentials);
    };
    if !encoder.matches(password, &user.password) {
        warn!(user_id = %user.id, "Sign-in rejected");
        return Err(AuthError::BadCredentials);
    }

    let issued = tokens.issue(&user.email, &user.roles)?;
    info!(user_id = %user.id, "Sign-in succeeded");
    Ok(issued)
}
