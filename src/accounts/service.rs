// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account lifecycle orchestration (validator → encoder → store).

use tracing::info;
use uuid::Uuid;

use super::{AccountError, UserValidator};
use crate::auth::roles::DEFAULT_ROLE;
use crate::models::User;
use crate::password::PasswordEncoder;
use crate::store::{StorageError, UserStore};

/// Suffix appended to the email local-part for administrator-provisioned
/// initial passwords.
pub const ADMIN_PASSWORD_SUFFIX: &str = "123";

pub struct AccountService<'a> {
    store: &'a dyn UserStore,
    encoder: &'a dyn PasswordEncoder,
}

impl<'a> AccountService<'a> {
    pub fn new(store: &'a dyn UserStore, encoder: &'a dyn PasswordEncoder) -> Self {
        Self { store, encoder }
    }

    /// Self-registration. Applies the default role when none is supplied.
    pub fn create(&self, mut user: User) -> Result<User, AccountError> {
        UserValidator::new(self.store).validate(&user)?;
        user.password = self.encoder.encode(&user.password)?;
        if !has_roles(&user) {
            user.roles = vec![DEFAULT_ROLE.to_string()];
        }

        let saved = self.store.insert(user).map_err(duplicate_on_conflict)?;
        info!(user_id = %saved.id, roles = ?saved.roles, "User registered");
        Ok(saved)
    }

    /// Administrator provisioning. Any password on the input is ignored; the
    /// initial credential is `<email local-part>123`. Roles are kept as
    /// supplied and must not be empty.
    pub fn create_by_admin(&self, mut user: User) -> Result<User, AccountError> {
        require_roles(&user)?;
        UserValidator::new(self.store).validate(&user)?;
        user.password = self.encoder.encode(&default_admin_password(&user.email))?;

        let saved = self.store.insert(user).map_err(duplicate_on_conflict)?;
        info!(user_id = %saved.id, roles = ?saved.roles, "User provisioned by administrator");
        Ok(saved)
    }

    /// Re-encodes the supplied password and persists the record.
    pub fn update(&self, mut user: User) -> Result<User, AccountError> {
        require_roles(&user)?;
        UserValidator::new(self.store).validate(&user)?;
        user.password = self.encoder.encode(&user.password)?;

        let saved = self.store.save(user).map_err(duplicate_on_conflict)?;
        info!(user_id = %saved.id, "User updated");
        Ok(saved)
    }

    pub fn delete(&self, user: &User) -> Result<(), AccountError> {
        self.store.delete(user.id)?;
        info!(user_id = %user.id, "User deleted");
        Ok(())
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        Ok(self.store.find_by_email(email)?)
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        Ok(self.store.find_by_id(id)?)
    }
}

/// Initial password for administrator-provisioned accounts.
pub fn default_admin_password(email: &str) -> String {
    let local_part = email.split('@').next().unwrap_or(email);
    format!("{local_part}{ADMIN_PASSWORD_SUFFIX}")
}

fn has_roles(user: &User) -> bool {
    user.roles.iter().any(|role| !role.trim().is_empty())
}

fn require_roles(user: &User) -> Result<(), AccountError> {
    if has_roles(user) {
        Ok(())
    } else {
        Err(AccountError::MissingRoles)
    }
}

/// The store's uniqueness constraint backs up the validator when two
/// registrations race past the pre-check.
fn duplicate_on_conflict(err: StorageError) -> AccountError {
    match err {
        StorageError::AlreadyExists(what) => AccountError::DuplicateRegistration(what),
        other => AccountError::Storage(other),
    }
}
