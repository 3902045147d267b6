// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims carried by issued tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form claims added on top of the registered ones.
pub type ClaimMap = serde_json::Map<String, Value>;

/// Claim holding the principal's role names (JSON array of strings).
pub const ROLES_CLAIM: &str = "roles";

/// Claim holding the principal's username.
pub const USERNAME_CLAIM: &str = "username";

/// Claim names written by the codec itself; extra claims may not use them.
pub const RESERVED_CLAIMS: [&str; 5] = ["sub", "iss", "iat", "exp", "token_use"];

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    /// Short-lived bearer credential
    Access,
    /// Long-lived credential accepted only by the refresh endpoint
    Refresh,
}

/// Claims decoded from a verified token.
///
/// `iat` and `exp` are held as milliseconds since the Unix epoch. On the wire
/// they are RFC 7519 NumericDate values (seconds) with a fractional part when
/// the instant is not on a whole second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (principal identifier)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (epoch milliseconds)
    #[serde(with = "numeric_date")]
    pub iat: i64,

    /// Expiration (epoch milliseconds)
    #[serde(with = "numeric_date")]
    pub exp: i64,

    /// Intended use; absent on tokens issued through [`TokenCodec::issue`](super::TokenCodec::issue)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_use: Option<TokenUse>,

    /// Any other claims
    #[serde(flatten)]
    pub extra: ClaimMap,
}

impl TokenClaims {
    /// Role names from the `roles` claim. Non-string entries are skipped.
    pub fn roles(&self) -> Vec<String> {
        match self.extra.get(ROLES_CLAIM) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The `username` claim, if present.
    pub fn username(&self) -> Option<&str> {
        self.extra.get(USERNAME_CLAIM).and_then(Value::as_str)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.exp)
    }
}

/// Build the extra-claims map carrying roles and username.
pub fn principal_claims<I, R>(username: &str, roles: I) -> ClaimMap
where
    I: IntoIterator<Item = R>,
    R: Into<String>,
{
    let roles: Vec<Value> = roles.into_iter().map(|r| Value::String(r.into())).collect();
    let mut claims = ClaimMap::new();
    claims.insert(USERNAME_CLAIM.to_string(), Value::String(username.to_string()));
    claims.insert(ROLES_CLAIM.to_string(), Value::Array(roles));
    claims
}

mod numeric_date {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(millis: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        if millis % 1000 == 0 {
            serializer.serialize_i64(millis / 1000)
        } else {
            serializer.serialize_f64(*millis as f64 / 1000.0)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        if !seconds.is_finite() {
            return Err(D::Error::custom("NumericDate must be a finite number"));
        }
        Ok((seconds * 1000.0).round() as i64)
    }
}
