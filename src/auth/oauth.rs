// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth 2.0 authorization-code client for federated login.
//!
//! ## Flow
//!
//! 1. `GET /oauth2/authorization/{provider}` redirects to the provider with a
//!    signed `state` and a PKCE S256 challenge. The browser also receives the
//!    state in an HttpOnly cookie
//! 2. The provider calls back `GET /login/oauth2/code/{provider}?code&state`;
//!    the query state must equal the cookie
//! 3. The code is exchanged for a provider access token with the PKCE verifier
//! 4. The userinfo endpoint yields the profile handed to the
//!    [`SocialLoginBridge`](super::social::SocialLoginBridge)
//!
//! `state` is stateless: `{nonce}.{expiry_ms}.{hmac}` keyed from the token
//! signing key, so no server-side session is needed to check it. The PKCE
//! verifier is an HMAC of the state under the same key and never leaves the
//! server before the code exchange.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use super::signing_key::SigningKey;
use super::social::FederatedIdentity;
use crate::config::OAuthConfig;

/// How long a login attempt may take between redirect and callback.
pub const STATE_TTL_MINUTES: i64 = 10;

const STATE_DOMAIN: &[u8] = b"oauth-state:";
const PKCE_DOMAIN: &[u8] = b"oauth-pkce:";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("invalid or expired state parameter")]
    InvalidState,

    #[error("provider returned an error: {0}")]
    ProviderDenied(String),

    #[error("authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("userinfo request failed: {0}")]
    UserInfo(String),

    #[error("provider profile has no usable '{0}' attribute")]
    MissingAttribute(String),

    #[error("provider reports the email address as unverified")]
    UnverifiedEmail,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
}

/// Provider redirect plus the state the browser must echo back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
}

pub struct OAuthClient {
    config: OAuthConfig,
    key: Arc<SigningKey>,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, key: Arc<SigningKey>) -> Self {
        Self {
            config,
            key,
            http: reqwest::Client::new(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    pub fn landing_url(&self) -> &str {
        &self.config.landing_url
    }

    pub fn auto_register(&self) -> bool {
        self.config.auto_register
    }

    /// Whether the callback is served over TLS (cookies get `Secure`).
    pub fn https_callback(&self) -> bool {
        self.config.redirect_uri.scheme() == "https"
    }

    pub fn begin(&self) -> AuthorizationRequest {
        self.begin_at(Utc::now())
    }

    /// Provider authorization URL carrying a fresh signed state and the
    /// PKCE challenge derived from it.
    pub fn begin_at(&self, now: DateTime<Utc>) -> AuthorizationRequest {
        let state = self.issue_state_at(now);
        let challenge =
            Base64UrlUnpadded::encode_string(&Sha256::digest(self.pkce_verifier(&state)));

        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &self.config.scopes)
            .append_pair("state", &state)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256");
        AuthorizationRequest { url, state }
    }

    pub fn issue_state_at(&self, now: DateTime<Utc>) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        let expires = (now + TimeDelta::minutes(STATE_TTL_MINUTES)).timestamp_millis();
        let body = format!("{nonce}.{expires}");
        let tag = Base64UrlUnpadded::encode_string(&self.key.mac(&state_input(&body)));
        format!("{body}.{tag}")
    }

    pub fn verify_state_at(&self, state: &str, now: DateTime<Utc>) -> Result<(), OAuthError> {
        let (body, tag) = state.rsplit_once('.').ok_or(OAuthError::InvalidState)?;
        let (_nonce, expires) = body.split_once('.').ok_or(OAuthError::InvalidState)?;
        let expires: i64 = expires.parse().map_err(|_| OAuthError::InvalidState)?;
        let tag = Base64UrlUnpadded::decode_vec(tag).map_err(|_| OAuthError::InvalidState)?;

        if !self.key.verify_mac(&state_input(body), &tag) {
            return Err(OAuthError::InvalidState);
        }
        if now.timestamp_millis() >= expires {
            return Err(OAuthError::InvalidState);
        }
        Ok(())
    }

    /// Check the callback's `state` against the one stored in the browser
    /// that started the flow, then its signature and expiry.
    pub fn verify_callback_at(
        &self,
        state: &str,
        browser_state: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), OAuthError> {
        if browser_state != Some(state) {
            return Err(OAuthError::InvalidState);
        }
        self.verify_state_at(state, now)
    }

    fn pkce_verifier(&self, state: &str) -> String {
        let input = [PKCE_DOMAIN, state.as_bytes()].concat();
        Base64UrlUnpadded::encode_string(&self.key.mac(&input))
    }

    /// Exchange an authorization code for the provider's access token.
    /// `state` is the verified callback state the PKCE verifier derives from.
    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<String, OAuthError> {
        let verifier = self.pkce_verifier(state);
        let response = self
            .http
            .post(self.config.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code_verifier", verifier.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?
            .error_for_status()
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let token: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;
        Ok(token.access_token)
    }

    /// Fetch the userinfo profile and map it to a federated identity.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<FederatedIdentity, OAuthError> {
        let profile: Map<String, Value> = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::UserInfo(e.to_string()))?
            .error_for_status()
            .map_err(|e| OAuthError::UserInfo(e.to_string()))?
            .json()
            .await
            .map_err(|e| OAuthError::UserInfo(e.to_string()))?;

        self.identity_from_profile(profile)
    }

    pub fn identity_from_profile(
        &self,
        attributes: Map<String, Value>,
    ) -> Result<FederatedIdentity, OAuthError> {
        let attribute = &self.config.email_attribute;
        let email = attributes
            .get(attribute)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| OAuthError::MissingAttribute(attribute.clone()))?
            .to_string();

        if attributes.get("email_verified").and_then(Value::as_bool) == Some(false) {
            return Err(OAuthError::UnverifiedEmail);
        }

        Ok(FederatedIdentity {
            provider: self.config.provider.clone(),
            email,
            attributes,
        })
    }
}

fn state_input(body: &str) -> Vec<u8> {
    [STATE_DOMAIN, body.as_bytes()].concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::oauth_config;
    use serde_json::json;

    fn client(secret: &str) -> OAuthClient {
        OAuthClient::new(
            oauth_config(),
            Arc::new(SigningKey::from_secret(secret).unwrap()),
        )
    }

    fn profile(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn authorization_url_carries_client_parameters() {
        let client = client("k1");
        let AuthorizationRequest { url, state } = client.begin();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("provider.example"));
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:8080/login/oauth2/code/google"
        );
        assert_eq!(params["scope"], "openid email profile");
        assert_eq!(params["state"], state);
        assert!(client.verify_state_at(&state, Utc::now()).is_ok());
    }

    #[test]
    fn pkce_challenge_is_s256_of_state_bound_verifier() {
        let client = client("k1");
        let AuthorizationRequest { url, state } = client.begin();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        let verifier = client.pkce_verifier(&state);
        assert!((43..=128).contains(&verifier.len()));
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(
            params["code_challenge"],
            Base64UrlUnpadded::encode_string(&Sha256::digest(&verifier))
        );
        assert!(!url.as_str().contains(&verifier));

        let other = client.begin();
        assert_ne!(client.pkce_verifier(&other.state), verifier);
    }

    #[test]
    fn callback_state_must_match_browser_cookie() {
        let client = client("k1");
        let now = Utc::now();
        let state = client.issue_state_at(now);
        let someone_elses = client.issue_state_at(now);

        assert!(client.verify_callback_at(&state, Some(&state), now).is_ok());
        assert!(matches!(
            client.verify_callback_at(&state, None, now),
            Err(OAuthError::InvalidState)
        ));
        assert!(matches!(
            client.verify_callback_at(&state, Some(&someone_elses), now),
            Err(OAuthError::InvalidState)
        ));
        assert!(matches!(
            client.verify_callback_at(&state, Some(&state), now + TimeDelta::minutes(11)),
            Err(OAuthError::InvalidState)
        ));
    }

    #[test]
    fn state_expires() {
        let client = client("k1");
        let issued = Utc::now();
        let state = client.issue_state_at(issued);

        assert!(client
            .verify_state_at(&state, issued + TimeDelta::minutes(9))
            .is_ok());
        assert!(matches!(
            client.verify_state_at(&state, issued + TimeDelta::minutes(10)),
            Err(OAuthError::InvalidState)
        ));
    }

    #[test]
    fn state_from_other_key_or_tampered_is_rejected() {
        let now = Utc::now();
        let state = client("k1").issue_state_at(now);
        assert!(client("k2").verify_state_at(&state, now).is_err());

        let (body, tag) = state.rsplit_once('.').unwrap();
        let (nonce, expires) = body.split_once('.').unwrap();
        let later: i64 = expires.parse::<i64>().unwrap() + 3_600_000;
        let forged = format!("{nonce}.{later}.{tag}");
        assert!(client("k1").verify_state_at(&forged, now).is_err());

        assert!(client("k1").verify_state_at("garbage", now).is_err());
        assert!(client("k1").verify_state_at("", now).is_err());
    }

    #[test]
    fn identity_uses_configured_email_attribute() {
        let identity = client("k1")
            .identity_from_profile(profile(json!({
                "email": " ana@ex.com ",
                "name": "Ana",
                "email_verified": true
            })))
            .unwrap();

        assert_eq!(identity.email, "ana@ex.com");
        assert_eq!(identity.provider, "google");
        assert_eq!(identity.attributes["name"], "Ana");
    }

    #[test]
    fn identity_requires_email() {
        let result = client("k1").identity_from_profile(profile(json!({ "name": "Ana" })));
        assert!(matches!(result, Err(OAuthError::MissingAttribute(attr)) if attr == "email"));
    }

    #[test]
    fn unverified_email_is_rejected() {
        let result = client("k1").identity_from_profile(profile(json!({
            "email": "ana@ex.com",
            "email_verified": false
        })));
        assert!(matches!(result, Err(OAuthError::UnverifiedEmail)));
    }
}
