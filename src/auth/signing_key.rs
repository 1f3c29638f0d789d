// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide HMAC signing key.
//!
//! The configured raw secret is base64-encoded exactly once, here, and the
//! encoded bytes become the HMAC-SHA256 key for both signing and verifying.
//! Issuer and verifier hold the same `Arc<SigningKey>`, so the two sides
//! cannot drift apart in how they derive the key.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use jsonwebtoken::{DecodingKey, EncodingKey};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SigningKeyError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Immutable key material derived once at startup.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    mac: HmacSha256,
}

impl SigningKey {
    pub fn from_secret(raw_secret: &str) -> Result<Self, SigningKeyError> {
        if raw_secret.is_empty() {
            return Err(SigningKeyError::EmptySecret);
        }

        let material = Base64::encode_string(raw_secret.as_bytes());
        let mac = HmacSha256::new_from_slice(material.as_bytes())
            .map_err(|e| SigningKeyError::InvalidKey(e.to_string()))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(material.as_bytes()),
            decoding: DecodingKey::from_secret(material.as_bytes()),
            mac,
        })
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// HMAC-SHA256 tag over `data` under the same key material.
    pub fn mac(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time tag comparison.
    pub fn verify_mac(&self, data: &[u8], tag: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.verify_slice(tag).is_ok()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey { .. }")
    }
}
