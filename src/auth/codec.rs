// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance.
//!
//! Tokens are compact JWS strings signed with the process-wide HMAC secret.
//! Issuance is a pure function of its inputs and the secret: the same
//! subject, claims, `issued_at` and ttl always produce the same string.

use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use utoipa::ToSchema;

use super::claims::{ClaimMap, TokenClaims, TokenUse, RESERVED_CLAIMS};
use super::error::IssueError;
use super::secret::SecretKey;

/// Access and refresh token issued together for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access_token: String,
    /// Long-lived token accepted by the refresh endpoint
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in milliseconds
    pub expires_in: i64,
    /// Access token expiry (epoch milliseconds)
    pub expires_at: i64,
}

/// Signs tokens for a configured issuer.
#[derive(Clone)]
pub struct TokenCodec {
    key: EncodingKey,
    header: Header,
    issuer: String,
}

impl TokenCodec {
    pub fn new(secret: &SecretKey, algorithm: Algorithm, issuer: impl Into<String>) -> Self {
        Self {
            key: secret.encoding_key(),
            header: Header::new(algorithm),
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Issue a token for `subject` valid from `issued_at` (epoch ms) for `ttl`.
    pub fn issue(
        &self,
        subject: &str,
        claims: &ClaimMap,
        issued_at: i64,
        ttl: Duration,
    ) -> Result<String, IssueError> {
        self.sign(subject, claims, issued_at, ttl, None)
    }

    /// Issue an access/refresh pair sharing `subject`.
    ///
    /// Extra claims go into the access token only; the refresh token carries
    /// just the registered claims.
    pub fn issue_pair(
        &self,
        subject: &str,
        claims: &ClaimMap,
        now: i64,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair, IssueError> {
        let access_token = self.sign(subject, claims, now, access_ttl, Some(TokenUse::Access))?;
        let refresh_token = self.sign(
            subject,
            &ClaimMap::new(),
            now,
            refresh_ttl,
            Some(TokenUse::Refresh),
        )?;
        let expires_in = ttl_millis(access_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at: now + expires_in,
        })
    }

    fn sign(
        &self,
        subject: &str,
        claims: &ClaimMap,
        issued_at: i64,
        ttl: Duration,
        token_use: Option<TokenUse>,
    ) -> Result<String, IssueError> {
        if subject.is_empty() {
            return Err(IssueError::EmptySubject);
        }
        if let Some(reserved) = RESERVED_CLAIMS.iter().find(|name| claims.contains_key(**name)) {
            return Err(IssueError::ReservedClaim((*reserved).to_string()));
        }

        let exp = issued_at
            .checked_add(ttl_millis(ttl)?)
            .ok_or(IssueError::TimestampOverflow)?;

        let payload = TokenClaims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: issued_at,
            exp,
            token_use,
            extra: claims.clone(),
        };

        encode(&self.header, &payload, &self.key).map_err(|e| IssueError::Signing(e.to_string()))
    }
}

fn ttl_millis(ttl: Duration) -> Result<i64, IssueError> {
    let millis = i64::try_from(ttl.as_millis()).map_err(|_| IssueError::TimestampOverflow)?;
    if millis <= 0 {
        return Err(IssueError::NonPositiveTtl);
    }
    Ok(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::principal_claims;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const NOW: i64 = 1_700_000_000_000;

    fn codec() -> TokenCodec {
        let secret = SecretKey::new("J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W").unwrap();
        TokenCodec::new(&secret, Algorithm::HS256, "stateless-auth")
    }

    fn payload(token: &str) -> serde_json::Value {
        let segment = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn issue_produces_three_segments() {
        let token = codec()
            .issue("42", &ClaimMap::new(), NOW, Duration::from_secs(60))
            .unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn issue_is_deterministic() {
        let claims = principal_claims("alice", ["ROLE_USER"]);
        let first = codec().issue("42", &claims, NOW, Duration::from_secs(60)).unwrap();
        let second = codec().issue("42", &claims, NOW, Duration::from_secs(60)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn payload_carries_registered_claims() {
        let token = codec()
            .issue("42", &ClaimMap::new(), NOW, Duration::from_millis(1500))
            .unwrap();
        let body = payload(&token);
        assert_eq!(body["sub"], "42");
        assert_eq!(body["iss"], "stateless-auth");
        assert_eq!(body["iat"], 1_700_000_000);
        assert_eq!(body["exp"], serde_json::json!(1_700_000_001.5));
        assert!(body.get("token_use").is_none());
    }

    #[test]
    fn empty_subject_is_rejected() {
        let err = codec()
            .issue("", &ClaimMap::new(), NOW, Duration::from_secs(60))
            .unwrap_err();
        assert_eq!(err, IssueError::EmptySubject);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let err = codec()
            .issue("42", &ClaimMap::new(), NOW, Duration::ZERO)
            .unwrap_err();
        assert_eq!(err, IssueError::NonPositiveTtl);
    }

    #[test]
    fn reserved_claims_cannot_be_overridden() {
        let mut claims = ClaimMap::new();
        claims.insert("exp".to_string(), serde_json::json!(0));
        let err = codec()
            .issue("42", &claims, NOW, Duration::from_secs(60))
            .unwrap_err();
        assert_eq!(err, IssueError::ReservedClaim("exp".to_string()));
    }

    #[test]
    fn pair_shares_subject_with_distinct_lifetimes() {
        let claims = principal_claims("alice", ["ROLE_USER"]);
        let pair = codec()
            .issue_pair(
                "42",
                &claims,
                NOW,
                Duration::from_secs(900),
                Duration::from_secs(7 * 24 * 3600),
            )
            .unwrap();

        let access = payload(&pair.access_token);
        let refresh = payload(&pair.refresh_token);
        assert_eq!(access["sub"], "42");
        assert_eq!(refresh["sub"], "42");
        assert_eq!(access["token_use"], "access");
        assert_eq!(refresh["token_use"], "refresh");
        assert_eq!(access["roles"], serde_json::json!(["ROLE_USER"]));
        assert!(refresh.get("roles").is_none());
        assert_eq!(pair.expires_in, 900_000);
        assert_eq!(pair.expires_at, NOW + 900_000);
        assert_eq!(pair.token_type, "Bearer");
    }
}
