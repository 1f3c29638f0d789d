// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup into an
//! immutable [`AppConfig`] that is passed by value into the components that
//! need it. Nothing reads the environment after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SECURITY_JWT_TOKEN_SECRET_KEY` | `security.jwt.token.secret-key`: raw signing secret | Required |
//! | `SECURITY_JWT_TOKEN_EXPIRE_LENGTH` | `security.jwt.token.expire-length`: token validity (ms) | `3600000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `PUBLIC_ORIGIN` | Server origin, stamped as access-token issuer | `http://localhost:{PORT}` |
//! | `SEED_ADMIN_EMAIL` | Provision an `ADMIN` account at startup | Optional |
//! | `LOG_FORMAT` | Logging format (`json`, `pretty` or `compact`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Federated login is enabled when `OAUTH_CLIENT_ID` is set:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OAUTH_PROVIDER` | Provider registration name used in URLs | `google` |
//! | `OAUTH_CLIENT_ID` / `OAUTH_CLIENT_SECRET` | Client credentials | Required |
//! | `OAUTH_AUTHORIZE_URL` | Authorization endpoint | Google |
//! | `OAUTH_TOKEN_URL` | Token endpoint | Google |
//! | `OAUTH_USERINFO_URL` | Userinfo endpoint | Google |
//! | `OAUTH_REDIRECT_URI` | Callback URL registered with the provider | `{PUBLIC_ORIGIN}/login/oauth2/code/{OAUTH_PROVIDER}` |
//! | `OAUTH_SCOPES` | Space-separated scopes | `openid email profile` |
//! | `OAUTH_EMAIL_ATTRIBUTE` | Userinfo attribute holding the email | `email` |
//! | `OAUTH_LANDING_URL` | Where the client lands after federated login | `/` |
//! | `OAUTH_AUTO_REGISTER` | Create unknown users on first login | `true` |

use url::Url;

use crate::logging::LogFormat;

pub const SECRET_KEY_ENV: &str = "SECURITY_JWT_TOKEN_SECRET_KEY";
pub const EXPIRE_LENGTH_ENV: &str = "SECURITY_JWT_TOKEN_EXPIRE_LENGTH";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PUBLIC_ORIGIN_ENV: &str = "PUBLIC_ORIGIN";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const OAUTH_PROVIDER_ENV: &str = "OAUTH_PROVIDER";
pub const OAUTH_CLIENT_ID_ENV: &str = "OAUTH_CLIENT_ID";
pub const OAUTH_CLIENT_SECRET_ENV: &str = "OAUTH_CLIENT_SECRET";
pub const OAUTH_AUTHORIZE_URL_ENV: &str = "OAUTH_AUTHORIZE_URL";
pub const OAUTH_TOKEN_URL_ENV: &str = "OAUTH_TOKEN_URL";
pub const OAUTH_USERINFO_URL_ENV: &str = "OAUTH_USERINFO_URL";
pub const OAUTH_REDIRECT_URI_ENV: &str = "OAUTH_REDIRECT_URI";
pub const OAUTH_SCOPES_ENV: &str = "OAUTH_SCOPES";
pub const OAUTH_EMAIL_ATTRIBUTE_ENV: &str = "OAUTH_EMAIL_ATTRIBUTE";
pub const OAUTH_LANDING_URL_ENV: &str = "OAUTH_LANDING_URL";
pub const OAUTH_AUTO_REGISTER_ENV: &str = "OAUTH_AUTO_REGISTER";

/// Default token validity: one hour.
pub const DEFAULT_EXPIRE_LENGTH_MS: i64 = 3_600_000;

/// Longest accepted token validity: one year.
pub const MAX_EXPIRE_LENGTH_MS: i64 = 365 * 24 * 3_600_000;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Token signing settings.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret_key: String,
    pub expire_length_ms: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret_key", &"<redacted>")
            .field("expire_length_ms", &self.expire_length_ms)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub public_origin: String,
}

/// Federated login provider registration.
#[derive(Clone)]
pub struct OAuthConfig {
    pub provider: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
    pub redirect_uri: Url,
    pub scopes: String,
    pub email_attribute: String,
    pub landing_url: String,
    pub auto_register: bool,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("provider", &self.provider)
            .field("client_id", &self.client_id)
            .field("authorize_url", &self.authorize_url.as_str())
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("auto_register", &self.auto_register)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    pub oauth: Option<OAuthConfig>,
    pub log_format: LogFormat,
    pub seed_admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        // The secret is key material: taken byte for byte, only a blank value
        // counts as missing.
        let secret_key = lookup(SECRET_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(SECRET_KEY_ENV))?;
        let expire_length_ms = match get(EXPIRE_LENGTH_ENV) {
            Some(raw) => parse_positive_ms(&raw)?,
            None => DEFAULT_EXPIRE_LENGTH_MS,
        };

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => 8080,
        };
        let public_origin = get(PUBLIC_ORIGIN_ENV)
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason,
            })?,
            None => LogFormat::default(),
        };

        let oauth = match get(OAUTH_CLIENT_ID_ENV) {
            Some(client_id) => Some(oauth_config(&get, client_id, &public_origin)?),
            None => None,
        };

        Ok(Self {
            jwt: JwtConfig {
                secret_key,
                expire_length_ms,
            },
            server: ServerConfig {
                host,
                port,
                public_origin,
            },
            oauth,
            log_format,
            seed_admin_email: get(SEED_ADMIN_EMAIL_ENV),
        })
    }
}

fn parse_positive_ms(raw: &str) -> Result<i64, ConfigError> {
    match raw.parse::<i64>() {
        Ok(ms) if ms > MAX_EXPIRE_LENGTH_MS => Err(ConfigError::Invalid {
            name: EXPIRE_LENGTH_ENV,
            reason: format!("must not exceed {MAX_EXPIRE_LENGTH_MS}"),
        }),
        Ok(ms) if ms > 0 => Ok(ms),
        Ok(_) => Err(ConfigError::Invalid {
            name: EXPIRE_LENGTH_ENV,
            reason: "must be greater than zero".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            name: EXPIRE_LENGTH_ENV,
            reason: e.to_string(),
        }),
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn oauth_config<G>(get: &G, client_id: String, public_origin: &str) -> Result<OAuthConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let provider = get(OAUTH_PROVIDER_ENV).unwrap_or_else(|| "google".to_string());
    let client_secret =
        get(OAUTH_CLIENT_SECRET_ENV).ok_or(ConfigError::Missing(OAUTH_CLIENT_SECRET_ENV))?;

    let url_or = |name: &'static str, default: String| -> Result<Url, ConfigError> {
        parse_url(name, &get(name).unwrap_or(default))
    };

    let auto_register = match get(OAUTH_AUTO_REGISTER_ENV) {
        Some(raw) => raw.parse::<bool>().map_err(|e| ConfigError::Invalid {
            name: OAUTH_AUTO_REGISTER_ENV,
            reason: e.to_string(),
        })?,
        None => true,
    };

    Ok(OAuthConfig {
        authorize_url: url_or(OAUTH_AUTHORIZE_URL_ENV, GOOGLE_AUTHORIZE_URL.to_string())?,
        token_url: url_or(OAUTH_TOKEN_URL_ENV, GOOGLE_TOKEN_URL.to_string())?,
        userinfo_url: url_or(OAUTH_USERINFO_URL_ENV, GOOGLE_USERINFO_URL.to_string())?,
        redirect_uri: url_or(
            OAUTH_REDIRECT_URI_ENV,
            format!("{public_origin}/login/oauth2/code/{provider}"),
        )?,
        scopes: get(OAUTH_SCOPES_ENV).unwrap_or_else(|| "openid email profile".to_string()),
        email_attribute: get(OAUTH_EMAIL_ATTRIBUTE_ENV).unwrap_or_else(|| "email".to_string()),
        landing_url: get(OAUTH_LANDING_URL_ENV).unwrap_or_else(|| "/".to_string()),
        auto_register,
        provider,
        client_id,
        client_secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(
            config_from(&[]),
            Err(ConfigError::Missing(SECRET_KEY_ENV))
        ));
        assert!(matches!(
            config_from(&[(SECRET_KEY_ENV, "   ")]),
            Err(ConfigError::Missing(SECRET_KEY_ENV))
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[(SECRET_KEY_ENV, "s3cret")]).unwrap();
        assert_eq!(config.jwt.expire_length_ms, DEFAULT_EXPIRE_LENGTH_MS);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_origin, "http://localhost:8080");
        assert!(config.oauth.is_none());
        assert!(config.seed_admin_email.is_none());
    }

    #[test]
    fn expire_length_must_be_positive_integer() {
        let zero = config_from(&[(SECRET_KEY_ENV, "s"), (EXPIRE_LENGTH_ENV, "0")]);
        assert!(matches!(zero, Err(ConfigError::Invalid { .. })));

        let text = config_from(&[(SECRET_KEY_ENV, "s"), (EXPIRE_LENGTH_ENV, "soon")]);
        assert!(matches!(text, Err(ConfigError::Invalid { .. })));

        let ok = config_from(&[(SECRET_KEY_ENV, "s"), (EXPIRE_LENGTH_ENV, "90000")]).unwrap();
        assert_eq!(ok.jwt.expire_length_ms, 90_000);
    }

    #[test]
    fn expire_length_is_bounded() {
        let huge = config_from(&[
            (SECRET_KEY_ENV, "s"),
            (EXPIRE_LENGTH_ENV, "9223372036854775807"),
        ]);
        assert!(matches!(
            huge,
            Err(ConfigError::Invalid { name: EXPIRE_LENGTH_ENV, .. })
        ));

        let max = MAX_EXPIRE_LENGTH_MS.to_string();
        let ok = config_from(&[(SECRET_KEY_ENV, "s"), (EXPIRE_LENGTH_ENV, max.as_str())]).unwrap();
        assert_eq!(ok.jwt.expire_length_ms, MAX_EXPIRE_LENGTH_MS);
    }

    #[test]
    fn secret_is_kept_byte_for_byte() {
        let config = config_from(&[(SECRET_KEY_ENV, "  s3cret \n")]).unwrap();
        assert_eq!(config.jwt.secret_key, "  s3cret \n");
    }

    #[test]
    fn public_origin_drops_trailing_slash() {
        let config = config_from(&[
            (SECRET_KEY_ENV, "s"),
            (PUBLIC_ORIGIN_ENV, "https://api.viasegura.dev/"),
        ])
        .unwrap();
        assert_eq!(config.server.public_origin, "https://api.viasegura.dev");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = config_from(&[(SECRET_KEY_ENV, "s3cret-value")]).unwrap();
        assert!(!format!("{config:?}").contains("s3cret-value"));
    }

    #[test]
    fn oauth_enabled_by_client_id() {
        let config = config_from(&[
            (SECRET_KEY_ENV, "s"),
            (OAUTH_CLIENT_ID_ENV, "client"),
            (OAUTH_CLIENT_SECRET_ENV, "secret"),
        ])
        .unwrap();
        let oauth = config.oauth.unwrap();
        assert_eq!(oauth.provider, "google");
        assert_eq!(
            oauth.redirect_uri.as_str(),
            "http://localhost:8080/login/oauth2/code/google"
        );
        assert!(oauth.auto_register);
        assert_eq!(oauth.email_attribute, "email");
    }

    #[test]
    fn oauth_requires_client_secret() {
        let result = config_from(&[(SECRET_KEY_ENV, "s"), (OAUTH_CLIENT_ID_ENV, "client")]);
        assert!(matches!(
            result,
            Err(ConfigError::Missing(OAUTH_CLIENT_SECRET_ENV))
        ));
    }

    #[test]
    fn oauth_rejects_bad_urls_and_flags() {
        let bad_url = config_from(&[
            (SECRET_KEY_ENV, "s"),
            (OAUTH_CLIENT_ID_ENV, "c"),
            (OAUTH_CLIENT_SECRET_ENV, "x"),
            (OAUTH_TOKEN_URL_ENV, "not a url"),
        ]);
        assert!(matches!(bad_url, Err(ConfigError::Invalid { .. })));

        let bad_flag = config_from(&[
            (SECRET_KEY_ENV, "s"),
            (OAUTH_CLIENT_ID_ENV, "c"),
            (OAUTH_CLIENT_SECRET_ENV, "x"),
            (OAUTH_AUTO_REGISTER_ENV, "maybe"),
        ]);
        assert!(matches!(bad_flag, Err(ConfigError::Invalid { .. })));
    }
}
