// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential store adapter.
//!
//! [`UserStore`] is the boundary to wherever user records live. Implementations
//! must enforce email uniqueness themselves: `insert` and `save` reject a
//! record whose email already belongs to a different id. The account
//! validator's lookup is only a fast-path pre-check and is not atomic against
//! concurrent writers.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::User;

/// Error type for credential store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Lookup and persistence of [`User`] records.
pub trait UserStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    fn find_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;

    /// Persist a new record. Fails with `AlreadyExists` on a taken id or email.
    fn insert(&self, user: User) -> StorageResult<User>;

    /// Replace an existing record by id. Fails with `NotFound` for unknown ids
    /// and `AlreadyExists` if the email belongs to another record.
    fn save(&self, user: User) -> StorageResult<User>;

    fn delete(&self, id: Uuid) -> StorageResult<()>;
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// Process-local store. The email index and the record map are updated under
/// one write lock, which gives `insert` its uniqueness guarantee.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    fn find_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    fn insert(&self, user: User) -> StorageResult<User> {
        let mut tables = self.tables.write();
        if tables.users.contains_key(&user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        if tables.by_email.contains_key(&user.email) {
            return Err(StorageError::AlreadyExists(format!(
                "User with email {}",
                user.email
            )));
        }
        tables.by_email.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn save(&self, user: User) -> StorageResult<User> {
        let mut tables = self.tables.write();
        let previous_email = match tables.users.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => return Err(StorageError::NotFound(format!("User {}", user.id))),
        };
        if let Some(owner) = tables.by_email.get(&user.email) {
            if *owner != user.id {
                return Err(StorageError::AlreadyExists(format!(
                    "User with email {}",
                    user.email
                )));
            }
        }
        tables.by_email.remove(&previous_email);
        tables.by_email.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn delete(&self, id: Uuid) -> StorageResult<()> {
        let mut tables = self.tables.write();
        match tables.users.remove(&id) {
            Some(user) => {
                tables.by_email.remove(&user.email);
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("User {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(email, "hash", vec!["OPERADOR".to_string()])
    }

    #[test]
    fn insert_then_lookup_by_email_and_id() {
        let store = InMemoryUserStore::new();
        let saved = store.insert(user("a@b.com")).unwrap();

        assert_eq!(store.find_by_email("a@b.com").unwrap(), Some(saved.clone()));
        assert_eq!(store.find_by_id(saved.id).unwrap(), Some(saved));
        assert_eq!(store.find_by_email("A@B.COM").unwrap(), None);
    }

    #[test]
    fn insert_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.insert(user("a@b.com")).unwrap();

        let result = store.insert(user("a@b.com"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn save_requires_existing_record() {
        let store = InMemoryUserStore::new();
        let result = store.save(user("a@b.com"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn save_rejects_email_owned_by_another_record() {
        let store = InMemoryUserStore::new();
        store.insert(user("a@b.com")).unwrap();
        let mut other = store.insert(user("c@d.com")).unwrap();

        other.email = "a@b.com".to_string();
        assert!(matches!(
            store.save(other),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn save_reindexes_changed_email() {
        let store = InMemoryUserStore::new();
        let mut saved = store.insert(user("a@b.com")).unwrap();
        saved.email = "new@b.com".to_string();
        store.save(saved.clone()).unwrap();

        assert_eq!(store.find_by_email("a@b.com").unwrap(), None);
        assert_eq!(store.find_by_email("new@b.com").unwrap(), Some(saved));
    }

    #[test]
    fn delete_removes_record_and_index() {
        let store = InMemoryUserStore::new();
        let saved = store.insert(user("a@b.com")).unwrap();
        store.delete(saved.id).unwrap();

        assert!(store.is_empty());
        assert_eq!(store.find_by_email("a@b.com").unwrap(), None);
        assert!(matches!(
            store.delete(saved.id),
            Err(StorageError::NotFound(_))
        ));
    }
}
