// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped authentication context.

use serde_json::{Map, Value};

use super::roles;
use crate::models::User;

/// Identity resolved for the current request or federated session.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// Password login or bearer token.
    Local(User),
    /// External identity provider login.
    Federated(FederatedPrincipal),
}

/// Local user plus the raw profile the provider asserted.
#[derive(Debug, Clone, PartialEq)]
pub struct FederatedPrincipal {
    pub user: User,
    pub provider: String,
    pub attributes: Map<String, Value>,
}

/// The authenticated principal and the authorities granted to it.
///
/// Built once per request (or once per federated handshake) and never
/// mutated afterwards. Downstream code reads it only through the common
/// accessors, so it cannot tell which login path produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationContext {
    principal: Principal,
    authorities: Vec<String>,
}

impl AuthenticationContext {
    pub fn local(user: User, authorities: Vec<String>) -> Self {
        Self {
            principal: Principal::Local(user),
            authorities,
        }
    }

    pub fn federated(
        user: User,
        provider: impl Into<String>,
        attributes: Map<String, Value>,
        authorities: Vec<String>,
    ) -> Self {
        Self {
            principal: Principal::Federated(FederatedPrincipal {
                user,
                provider: provider.into(),
                attributes,
            }),
            authorities,
        }
    }

    /// Subject identifier (the user's email).
    pub fn subject(&self) -> &str {
        &self.user().email
    }

    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Local user record behind either principal kind.
    pub fn user(&self) -> &User {
        match &self.principal {
            Principal::Local(user) => user,
            Principal::Federated(federated) => &federated.user,
        }
    }

    pub fn has_authority(&self, required: &str) -> bool {
        roles::has_authority(&self.authorities, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("a@b.com", "hash", vec!["OPERADOR".to_string()])
    }

    #[test]
    fn local_and_federated_expose_same_accessors() {
        let authorities = vec!["OPERADOR".to_string()];
        let local = AuthenticationContext::local(user(), authorities.clone());

        let mut attributes = Map::new();
        attributes.insert("name".to_string(), Value::from("Ana"));
        let federated =
            AuthenticationContext::federated(user(), "google", attributes, authorities.clone());

        assert_eq!(local.subject(), federated.subject());
        assert_eq!(local.authorities(), federated.authorities());
        assert!(matches!(local.principal(), Principal::Local(_)));
        assert!(matches!(federated.principal(), Principal::Federated(_)));
    }

    #[test]
    fn federated_principal_keeps_provider_profile() {
        let mut attributes = Map::new();
        attributes.insert("email".to_string(), Value::from("a@b.com"));
        let ctx = AuthenticationContext::federated(user(), "google", attributes, vec![]);

        match ctx.principal() {
            Principal::Federated(federated) => {
                assert_eq!(federated.provider, "google");
                assert_eq!(federated.attributes["email"], "a@b.com");
            }
            Principal::Local(_) => panic!("expected federated principal"),
        }
    }

    #[test]
    fn authorities_come_from_constructor_not_user_record() {
        let ctx = AuthenticationContext::local(user(), vec!["ADMIN".to_string()]);
        assert!(ctx.has_authority("ADMIN"));
        assert!(!ctx.has_authority("OPERADOR"));
    }
}
