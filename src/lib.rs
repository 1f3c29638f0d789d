// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ViaSegura Auth - token-based authentication and authorization service
//!
//! Issues HMAC-signed bearer tokens for password and federated logins and
//! runs every request through an ordered authentication pipeline before the
//! authorization policy decides whether it may proceed.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Tokens, request pipeline, policy and social login
//! - `accounts` - User registration rules and lifecycle
//! - `store` - Credential store abstraction and in-memory backend
//! - `password` - One-way password encoding (Argon2)
//! - `server` - Listener and graceful shutdown

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod password;
pub mod server;
pub mod state;
pub mod store;

#[cfg(test)]
mod testutil;
