// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Social login bridge.
//!
//! Runs once at the end of a successful federated handshake: maps the
//! provider-asserted identity onto a local user and builds the same
//! [`AuthenticationContext`] shape a bearer token would produce.

use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::AuthenticationContext;
use crate::accounts::{AccountError, AccountService};
use crate::models::User;
use crate::password::PasswordEncoder;
use crate::store::UserStore;

/// Identity asserted by an external provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FederatedIdentity {
    pub provider: String,
    pub email: String,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum SocialLoginError {
    #[error("no local account for {0} and auto-registration is disabled")]
    UnknownUser(String),

    #[error(transparent)]
    Account(#[from] AccountError),
}

pub struct SocialLoginBridge<'a> {
    store: &'a dyn UserStore,
    encoder: &'a dyn PasswordEncoder,
    auto_register: bool,
}

impl<'a> SocialLoginBridge<'a> {
    pub fn new(
        store: &'a dyn UserStore,
        encoder: &'a dyn PasswordEncoder,
        auto_register: bool,
    ) -> Self {
        Self {
            store,
            encoder,
            auto_register,
        }
    }

    /// Resolve (or create on first sight) the local user and build the
    /// session's authentication context. Authorities are the stored roles.
    pub fn complete(
        &self,
        identity: FederatedIdentity,
    ) -> Result<AuthenticationContext, SocialLoginError> {
        let user = self.resolve_user(&identity)?;
        let authorities = user.roles.clone();
        Ok(AuthenticationContext::federated(
            user,
            identity.provider,
            identity.attributes,
            authorities,
        ))
    }

    fn resolve_user(&self, identity: &FederatedIdentity) -> Result<User, SocialLoginError> {
        let accounts = AccountService::new(self.store, self.encoder);
        if let Some(user) = accounts.find_by_email(&identity.email)? {
            return Ok(user);
        }
        if !self.auto_register {
            warn!(provider = %identity.provider, "Federated login for unregistered user refused");
            return Err(SocialLoginError::UnknownUser(identity.email.clone()));
        }

        // Federated accounts never log in with a password; give them one
        // nobody knows.
        let candidate = User::new(identity.email.clone(), Uuid::new_v4().to_string(), vec![]);
        match accounts.create(candidate) {
            Ok(user) => {
                info!(user_id = %user.id, provider = %identity.provider, "Registered user from federated login");
                Ok(user)
            }
            // Lost a race with a concurrent first login for the same email.
            Err(AccountError::DuplicateRegistration(_)) => accounts
                .find_by_email(&identity.email)?
                .ok_or_else(|| SocialLoginError::UnknownUser(identity.email.clone())),
            Err(e) => Err(e.into()),
        }
    }
}
