// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Declarative request authorization.
//!
//! An ordered table of `(pattern, method, access)` rules evaluated top to
//! bottom; the first matching rule decides. Requests matching no rule fall
//! through to the policy's default.
//!
//! ## Default Table
//!
//! | Pattern | Method | Access |
//! |---------|--------|--------|
//! | `/login/**` | any | permit |
//! | `/auth/login` | any | permit |
//! | `/usuarios/**` | `POST` | permit |
//! | `/oauth2/**` | any | permit |
//! | `/health/**` | any | permit |
//! | `/docs/**`, `/api-doc/**` | any | permit |
//! | everything else | any | authenticated |

use axum::http::Method;

use super::{AuthError, AuthenticationContext};

/// Access requirement attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    PermitAll,
    Authenticated,
}

/// Ant-style path pattern: `/a/b` matches exactly, `/a/**` matches `/a`
/// and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(base) => PathPattern::Subtree(base.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Subtree(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolicyRule {
    pattern: PathPattern,
    method: Option<Method>,
    access: Access,
}

impl PolicyRule {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<PolicyRule>,
    fallback: Access,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::builder()
            .permit_all("/login/**")
            .permit_all("/auth/login")
            .permit(Method::POST, "/usuarios/**")
            .permit_all("/oauth2/**")
            .permit_all("/health/**")
            .permit_all("/docs/**")
            .permit_all("/api-doc/**")
            .any_request_authenticated()
    }
}

impl AuthorizationPolicy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder { rules: Vec::new() }
    }

    /// Access required for a request; first matching rule wins.
    pub fn evaluate(&self, method: &Method, path: &str) -> Access {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.access)
            .unwrap_or(self.fallback)
    }

    /// Gate a request given whatever context the pipeline installed.
    pub fn check(
        &self,
        method: &Method,
        path: &str,
        context: Option<&AuthenticationContext>,
    ) -> Result<(), AuthError> {
        match (self.evaluate(method, path), context) {
            (Access::PermitAll, _) | (Access::Authenticated, Some(_)) => Ok(()),
            (Access::Authenticated, None) => Err(AuthError::AuthenticationRequired),
        }
    }
}

/// Builds the ordered rule table.
pub struct PolicyBuilder {
    rules: Vec<PolicyRule>,
}

impl PolicyBuilder {
    pub fn rule(mut self, method: Option<Method>, pattern: &str, access: Access) -> Self {
        self.rules.push(PolicyRule {
            pattern: PathPattern::parse(pattern),
            method,
            access,
        });
        self
    }

    pub fn permit_all(self, pattern: &str) -> Self {
        self.rule(None, pattern, Access::PermitAll)
    }

    pub fn permit(self, method: Method, pattern: &str) -> Self {
        self.rule(Some(method), pattern, Access::PermitAll)
    }

    /// Terminal rule: anything unmatched requires authentication.
    pub fn any_request_authenticated(self) -> AuthorizationPolicy {
        AuthorizationPolicy {
            rules: self.rules,
            fallback: Access::Authenticated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    #[test]
    fn subtree_pattern_matches_base_and_descendants() {
        let pattern = PathPattern::parse("/login/**");
        assert!(pattern.matches("/login"));
        assert!(pattern.matches("/login/oauth2/code/google"));
        assert!(!pattern.matches("/loginx"));
        assert!(!pattern.matches("/auth/login"));
    }

    #[test]
    fn exact_pattern_matches_only_itself() {
        let pattern = PathPattern::parse("/auth/login");
        assert!(pattern.matches("/auth/login"));
        assert!(!pattern.matches("/auth/login/extra"));
    }

    #[test]
    fn login_paths_are_public() {
        let policy = AuthorizationPolicy::default();
        assert_eq!(policy.evaluate(&Method::POST, "/auth/login"), Access::PermitAll);
        assert_eq!(policy.evaluate(&Method::GET, "/login"), Access::PermitAll);
        assert_eq!(
            policy.evaluate(&Method::GET, "/login/oauth2/code/google"),
            Access::PermitAll
        );
    }

    #[test]
    fn user_creation_is_public_only_for_post() {
        let policy = AuthorizationPolicy::default();
        assert_eq!(policy.evaluate(&Method::POST, "/usuarios"), Access::PermitAll);
        assert_eq!(policy.evaluate(&Method::GET, "/usuarios"), Access::Authenticated);
        assert_eq!(
            policy.evaluate(&Method::DELETE, "/usuarios/42"),
            Access::Authenticated
        );
    }

    #[test]
    fn everything_else_requires_authentication() {
        let policy = AuthorizationPolicy::default();
        assert_eq!(policy.evaluate(&Method::GET, "/me"), Access::Authenticated);
        assert_eq!(
            policy.evaluate(&Method::POST, "/admin/usuarios"),
            Access::Authenticated
        );
    }

    #[test]
    fn first_match_wins() {
        let policy = AuthorizationPolicy::builder()
            .rule(None, "/reports/private", Access::Authenticated)
            .permit_all("/reports/**")
            .any_request_authenticated();

        assert_eq!(
            policy.evaluate(&Method::GET, "/reports/private"),
            Access::Authenticated
        );
        assert_eq!(
            policy.evaluate(&Method::GET, "/reports/public"),
            Access::PermitAll
        );
    }

    #[test]
    fn check_requires_context_for_protected_paths() {
        let policy = AuthorizationPolicy::default();
        let ctx = AuthenticationContext::local(User::new("a@b.com", "h", vec![]), vec![]);

        assert_eq!(
            policy.check(&Method::GET, "/me", None),
            Err(AuthError::AuthenticationRequired)
        );
        assert!(policy.check(&Method::GET, "/me", Some(&ctx)).is_ok());
        assert!(policy.check(&Method::POST, "/auth/login", None).is_ok());
    }
}
