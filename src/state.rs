// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::accounts::AccountService;
use crate::auth::signing_key::SigningKeyError;
use crate::auth::{AuthorizationPolicy, OAuthClient, SigningKey, TokenProvider};
use crate::config::AppConfig;
use crate::password::PasswordEncoder;
use crate::store::UserStore;

/// Shared, read-mostly handles. The store is the only mutable shared state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub encoder: Arc<dyn PasswordEncoder>,
    pub tokens: Arc<TokenProvider>,
    pub policy: Arc<AuthorizationPolicy>,
    pub oauth: Option<Arc<OAuthClient>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        encoder: Arc<dyn PasswordEncoder>,
        tokens: TokenProvider,
    ) -> Self {
        Self {
            store,
            encoder,
            tokens: Arc::new(tokens),
            policy: Arc::new(AuthorizationPolicy::default()),
            oauth: None,
        }
    }

    /// Wire everything from configuration. The signing key is derived here,
    /// once, and shared by the token provider and the OAuth state signer.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn UserStore>,
        encoder: Arc<dyn PasswordEncoder>,
    ) -> Result<Self, SigningKeyError> {
        let key = Arc::new(SigningKey::from_secret(&config.jwt.secret_key)?);
        let tokens = TokenProvider::new(
            key.clone(),
            config.jwt.expire_length_ms,
            config.server.public_origin.clone(),
        );

        let mut state = Self::new(store, encoder, tokens);
        if let Some(oauth) = &config.oauth {
            state = state.with_oauth(OAuthClient::new(oauth.clone(), key));
        }
        Ok(state)
    }

    pub fn with_oauth(mut self, client: OAuthClient) -> Self {
        self.oauth = Some(Arc::new(client));
        self
    }

    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(self.store.as_ref(), self.encoder.as_ref())
    }
}
