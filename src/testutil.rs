// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use url::Url;

use crate::auth::{OAuthClient, SigningKey, TokenProvider};
use crate::config::OAuthConfig;
use crate::password::{PasswordEncoder, PasswordError};
use crate::state::AppState;
use crate::store::InMemoryUserStore;

pub const TEST_SECRET: &str = "test-secret-key";

/// Reversible encoder so tests can see what was stored. Counts `encode` and
/// `matches` calls.
#[derive(Debug, Default)]
pub struct PlainEncoder {
    calls: AtomicUsize,
    match_calls: AtomicUsize,
}

impl PlainEncoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn match_calls(&self) -> usize {
        self.match_calls.load(Ordering::SeqCst)
    }
}

impl PasswordEncoder for PlainEncoder {
    fn encode(&self, raw: &str) -> Result<String, PasswordError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("encoded:{raw}"))
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        self.match_calls.fetch_add(1, Ordering::SeqCst);
        encoded == format!("encoded:{raw}")
    }
}

pub fn signing_key(secret: &str) -> Arc<SigningKey> {
    Arc::new(SigningKey::from_secret(secret).unwrap())
}

/// One-minute tokens issued by `http://localhost:8080`.
pub fn provider_with_secret(secret: &str) -> TokenProvider {
    TokenProvider::new(signing_key(secret), 60_000, "http://localhost:8080")
}

pub fn oauth_config() -> OAuthConfig {
    OAuthConfig {
        provider: "google".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        authorize_url: Url::parse("https://provider.example/authorize").unwrap(),
        token_url: Url::parse("https://provider.example/token").unwrap(),
        userinfo_url: Url::parse("https://provider.example/userinfo").unwrap(),
        redirect_uri: Url::parse("http://localhost:8080/login/oauth2/code/google").unwrap(),
        scopes: "openid email profile".to_string(),
        email_attribute: "email".to_string(),
        landing_url: "http://localhost:3000/login/callback".to_string(),
        auto_register: true,
    }
}

pub fn oauth_client(auto_register: bool) -> OAuthClient {
    let config = OAuthConfig {
        auto_register,
        ..oauth_config()
    };
    OAuthClient::new(config, signing_key(TEST_SECRET))
}

pub fn test_state() -> AppState {
    AppState::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(PlainEncoder::default()),
        provider_with_secret(TEST_SECRET),
    )
}
