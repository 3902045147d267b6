// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Invalid
//! values abort startup with a [`ConfigError`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_SECRET_KEY` | HMAC signing secret (at least 32 bytes) | Required |
//! | `AUTH_ISSUER` | `iss` claim written and expected | `stateless-auth` |
//! | `AUTH_CHECK_ISSUER` | Reject tokens from other issuers | `true` |
//! | `AUTH_ALGORITHM` | `HS256`, `HS384` or `HS512` | `HS256` |
//! | `AUTH_ACCESS_TOKEN_EXPIRATION_MS` | Access token lifetime | `3600000` |
//! | `AUTH_REFRESH_TOKEN_EXPIRATION_MS` | Refresh token lifetime | `604800000` |
//! | `AUTH_TOKEN_PREFIX` | Prefix before the token in the header | `Bearer ` |
//! | `AUTH_HEADER_NAME` | Header carrying the token | `Authorization` |
//! | `AUTH_PUBLIC_PATHS` | Comma-separated public path patterns | `/api/auth/**,/api/public/**,/swagger-ui/**,/v3/api-docs/**` |
//! | `AUTH_CLOCK_SKEW_LEEWAY_MS` | Grace period after `exp` (max 300000) | `0` |
//! | `AUTH_PRINCIPAL_LOOKUP` | Token subject is the principal `id` or `username` | `id` |
//! | `AUTH_PRINCIPAL_LOOKUP_TIMEOUT_MS` | Bound on each credential store call | `2000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables TLS | unset |
//! | `SEED_USERS` | Dev accounts `id:username:password:ROLE_A+ROLE_B;...` | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderName};
use jsonwebtoken::Algorithm;

use crate::auth::principal::{PrincipalLookup, SeedUser};
use crate::auth::public_paths::PublicPaths;
use crate::auth::secret::{is_hmac, SecretKey, SecretKeyError};

pub const SECRET_KEY_ENV: &str = "AUTH_SECRET_KEY";
pub const ISSUER_ENV: &str = "AUTH_ISSUER";
pub const CHECK_ISSUER_ENV: &str = "AUTH_CHECK_ISSUER";
pub const ALGORITHM_ENV: &str = "AUTH_ALGORITHM";
pub const ACCESS_TOKEN_EXPIRATION_ENV: &str = "AUTH_ACCESS_TOKEN_EXPIRATION_MS";
pub const REFRESH_TOKEN_EXPIRATION_ENV: &str = "AUTH_REFRESH_TOKEN_EXPIRATION_MS";
pub const TOKEN_PREFIX_ENV: &str = "AUTH_TOKEN_PREFIX";
pub const HEADER_NAME_ENV: &str = "AUTH_HEADER_NAME";
pub const PUBLIC_PATHS_ENV: &str = "AUTH_PUBLIC_PATHS";
pub const CLOCK_SKEW_LEEWAY_ENV: &str = "AUTH_CLOCK_SKEW_LEEWAY_MS";
pub const PRINCIPAL_LOOKUP_ENV: &str = "AUTH_PRINCIPAL_LOOKUP";
pub const PRINCIPAL_LOOKUP_TIMEOUT_ENV: &str = "AUTH_PRINCIPAL_LOOKUP_TIMEOUT_MS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const SEED_USERS_ENV: &str = "SEED_USERS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_ISSUER: &str = "stateless-auth";
pub const DEFAULT_TOKEN_PREFIX: &str = "Bearer ";
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_millis(3_600_000);
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_millis(604_800_000);
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Upper bound on the clock-skew leeway.
pub const MAX_CLOCK_SKEW_LEEWAY: Duration = Duration::from_millis(300_000);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("AUTH_SECRET_KEY: {0}")]
    Secret(#[from] SecretKeyError),
}

fn invalid(var: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.into(),
    }
}

/// Token and interception settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: SecretKey,
    pub issuer: String,
    pub check_issuer: bool,
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub token_prefix: String,
    pub header_name: HeaderName,
    pub public_paths: PublicPaths,
    pub clock_skew_leeway: Duration,
    pub principal_lookup: PrincipalLookup,
    pub principal_lookup_timeout: Duration,
}

impl AuthSettings {
    /// Defaults for everything but the secret.
    pub fn new(secret: SecretKey) -> Self {
        Self {
            secret,
            issuer: DEFAULT_ISSUER.to_string(),
            check_issuer: true,
            algorithm: Algorithm::HS256,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            token_prefix: DEFAULT_TOKEN_PREFIX.to_string(),
            header_name: AUTHORIZATION,
            public_paths: PublicPaths::default(),
            clock_skew_leeway: Duration::ZERO,
            principal_lookup: PrincipalLookup::Id,
            principal_lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load settings through `get`, which returns the raw value of a variable.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = get(SECRET_KEY_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(SECRET_KEY_ENV))?;
        let mut settings = Self::new(SecretKey::new(secret)?);

        if let Some(issuer) = get(ISSUER_ENV) {
            if issuer.trim().is_empty() {
                return Err(invalid(ISSUER_ENV, "must not be empty"));
            }
            settings.issuer = issuer.trim().to_string();
        }
        if let Some(value) = get(CHECK_ISSUER_ENV) {
            settings.check_issuer = parse_bool(CHECK_ISSUER_ENV, &value)?;
        }
        if let Some(value) = get(ALGORITHM_ENV) {
            let algorithm: Algorithm = value
                .trim()
                .parse()
                .map_err(|_| invalid(ALGORITHM_ENV, format!("unknown algorithm `{value}`")))?;
            if !is_hmac(algorithm) {
                return Err(invalid(ALGORITHM_ENV, "only HS256, HS384 and HS512 are supported"));
            }
            settings.algorithm = algorithm;
        }
        if let Some(value) = get(ACCESS_TOKEN_EXPIRATION_ENV) {
            settings.access_token_ttl = parse_positive_millis(ACCESS_TOKEN_EXPIRATION_ENV, &value)?;
        }
        if let Some(value) = get(REFRESH_TOKEN_EXPIRATION_ENV) {
            settings.refresh_token_ttl =
                parse_positive_millis(REFRESH_TOKEN_EXPIRATION_ENV, &value)?;
        }
        if let Some(prefix) = get(TOKEN_PREFIX_ENV) {
            settings.token_prefix = prefix;
        }
        if let Some(value) = get(HEADER_NAME_ENV) {
            settings.header_name = HeaderName::from_bytes(value.trim().as_bytes())
                .map_err(|e| invalid(HEADER_NAME_ENV, e.to_string()))?;
        }
        if let Some(value) = get(PUBLIC_PATHS_ENV) {
            settings.public_paths = PublicPaths::new(value.split(','));
        }
        if let Some(value) = get(CLOCK_SKEW_LEEWAY_ENV) {
            let leeway = parse_millis(CLOCK_SKEW_LEEWAY_ENV, &value)?;
            if leeway > MAX_CLOCK_SKEW_LEEWAY {
                return Err(invalid(
                    CLOCK_SKEW_LEEWAY_ENV,
                    format!("must not exceed {} ms", MAX_CLOCK_SKEW_LEEWAY.as_millis()),
                ));
            }
            settings.clock_skew_leeway = leeway;
        }
        if let Some(value) = get(PRINCIPAL_LOOKUP_ENV) {
            settings.principal_lookup = PrincipalLookup::parse(&value)
                .ok_or_else(|| invalid(PRINCIPAL_LOOKUP_ENV, "expected `id` or `username`"))?;
        }
        if let Some(value) = get(PRINCIPAL_LOOKUP_TIMEOUT_ENV) {
            settings.principal_lookup_timeout =
                parse_positive_millis(PRINCIPAL_LOOKUP_TIMEOUT_ENV, &value)?;
        }

        Ok(settings)
    }
}

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// PEM certificate and key paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Process-level settings: bind address, TLS, logging, dev accounts.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub tls: Option<TlsSettings>,
    pub log_format: LogFormat,
    pub seed_users: Vec<SeedUser>,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match get(PORT_ENV) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| invalid(PORT_ENV, format!("`{value}` is not a port")))?,
            None => 8080,
        };
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid(HOST_ENV, e.to_string()))?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsSettings {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(invalid(
                    LOG_FORMAT_ENV,
                    format!("expected `json` or `pretty`, got `{other}`"),
                ))
            }
        };

        let seed_users = match get(SEED_USERS_ENV) {
            Some(value) => parse_seed_users(&value)?,
            None => Vec::new(),
        };

        Ok(Self {
            addr,
            tls,
            log_format,
            seed_users,
        })
    }
}

/// Parse `id:username:password:ROLE_A+ROLE_B` entries separated by `;`.
pub fn parse_seed_users(value: &str) -> Result<Vec<SeedUser>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let fields: Vec<&str> = entry.splitn(4, ':').collect();
            let [id, username, password, roles] = fields.as_slice() else {
                return Err(invalid(
                    SEED_USERS_ENV,
                    "expected `id:username:password:ROLES`",
                ));
            };
            if id.is_empty() || username.is_empty() || password.is_empty() {
                return Err(invalid(SEED_USERS_ENV, "id, username and password are required"));
            }
            Ok(SeedUser {
                id: id.to_string(),
                username: username.to_string(),
                password: password.to_string(),
                roles: roles
                    .split('+')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect(),
            })
        })
        .collect()
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(var, format!("`{value}` is not a boolean"))),
    }
}

fn parse_millis(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| invalid(var, format!("`{value}` is not a number of milliseconds")))
}

fn parse_positive_millis(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let duration = parse_millis(var, value)?;
    if duration.is_zero() {
        return Err(invalid(var, "must be greater than zero"));
    }
    Ok(duration)
}
