// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Email uniqueness pre-check.

use super::AccountError;
use crate::models::User;
use crate::store::UserStore;

pub struct UserValidator<'a> {
    store: &'a dyn UserStore,
}

impl<'a> UserValidator<'a> {
    pub fn new(store: &'a dyn UserStore) -> Self {
        Self { store }
    }

    /// Fails with `DuplicateRegistration` when another record already owns
    /// the candidate's email. The candidate's own stored record (same id)
    /// is not a duplicate, so updates that keep the email pass.
    pub fn validate(&self, user: &User) -> Result<(), AccountError> {
        match self.store.find_by_email(&user.email)? {
            Some(existing) if existing.id != user.id => {
                Err(AccountError::DuplicateRegistration(user.email.clone()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;

    fn user(email: &str) -> User {
        User::new(email, "hash", vec!["OPERADOR".to_string()])
    }

    #[test]
    fn unknown_email_passes() {
        let store = InMemoryUserStore::new();
        assert!(UserValidator::new(&store).validate(&user("a@b.com")).is_ok());
    }

    #[test]
    fn new_user_with_taken_email_is_duplicate() {
        let store = InMemoryUserStore::new();
        store.insert(user("usuario@exemplo.com")).unwrap();

        let result = UserValidator::new(&store).validate(&user("usuario@exemplo.com"));
        assert!(matches!(result, Err(AccountError::DuplicateRegistration(email)) if email == "usuario@exemplo.com"));
    }

    #[test]
    fn update_of_same_record_with_unchanged_email_passes() {
        let store = InMemoryUserStore::new();
        let mut existing = store.insert(user("a@b.com")).unwrap();
        existing.password = "other-hash".to_string();

        assert!(UserValidator::new(&store).validate(&existing).is_ok());
    }

    #[test]
    fn email_comparison_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.insert(user("a@b.com")).unwrap();
        assert!(UserValidator::new(&store).validate(&user("A@b.com")).is_ok());
    }
}
