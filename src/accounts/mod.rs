// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Management
//!
//! Business rules enforced before a user record is written and therefore
//! before a token can ever be minted for it:
//!
//! - exactly one user per email (validator pre-check + store constraint)
//! - passwords are encoded before persistence
//! - self-registered accounts get the default role when none is supplied
//! - administrator-provisioned accounts get a derived initial password
//! - no create or update path persists a user without roles

pub mod service;
pub mod validator;

pub use service::AccountService;
pub use validator::UserValidator;

use crate::password::PasswordError;
use crate::store::StorageError;

/// Errors raised by account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("User already registered: {0}")]
    DuplicateRegistration(String),

    #[error("User must hold at least one role")]
    MissingRoles,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}
