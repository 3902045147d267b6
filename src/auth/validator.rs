// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token validation.
//!
//! [`TokenValidator::parse`] turns a token string into verified
//! [`TokenClaims`] or a [`TokenError`]. Checks run in a fixed order:
//!
//! 1. Structure: three non-empty base64url segments, a JSON header whose
//!    `alg` is the configured HMAC algorithm
//! 2. Signature against the shared secret
//! 3. Expiry: `now < exp` (plus the configured leeway, zero by default)
//! 4. Issuer, when an expected issuer is set
//!
//! All instants are epoch milliseconds. `jsonwebtoken` handles signature
//! verification only; its second-granularity time checks are disabled.

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};

use super::claims::TokenClaims;
use super::error::TokenError;
use super::secret::SecretKey;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Verifies tokens issued by a [`TokenCodec`](super::TokenCodec) sharing the same secret.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    expected_issuer: Option<String>,
    leeway_ms: i64,
}

impl TokenValidator {
    pub fn new(secret: &SecretKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            key: secret.decoding_key(),
            algorithm,
            validation,
            expected_issuer: None,
            leeway_ms: 0,
        }
    }

    /// Reject tokens whose `iss` differs from `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.expected_issuer = Some(issuer.into());
        self
    }

    /// Accept tokens up to `leeway` past their expiry.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway_ms = i64::try_from(leeway.as_millis()).unwrap_or(i64::MAX);
        self
    }

    /// Parse and verify `token` against the current wall clock.
    pub fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.parse_at(token, now_millis())
    }

    /// Parse and verify `token` as of `now` (epoch ms).
    pub fn parse_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        self.check_structure(token)?;

        let claims = decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed(
                "expiry is not after issued-at".to_string(),
            ));
        }

        if now >= claims.exp.saturating_add(self.leeway_ms) {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
            });
        }

        if let Some(expected) = &self.expected_issuer {
            if &claims.iss != expected {
                return Err(TokenError::Unsupported(format!(
                    "issuer `{}` is not accepted",
                    claims.iss
                )));
            }
        }

        Ok(claims)
    }

    /// `true` iff [`parse`](Self::parse) succeeds.
    pub fn validate(&self, token: &str) -> bool {
        self.parse(token).is_ok()
    }

    pub fn validate_at(&self, token: &str, now: i64) -> bool {
        self.parse_at(token, now).is_ok()
    }

    /// Subject of a valid token.
    pub fn subject(&self, token: &str) -> Result<String, TokenError> {
        self.parse(token).map(|claims| claims.sub)
    }

    /// Expiry of a valid token.
    pub fn expiration(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claims = self.parse(token)?;
        claims
            .expires_at()
            .ok_or_else(|| TokenError::Malformed("expiry out of range".to_string()))
    }

    fn check_structure(&self, token: &str) -> Result<(), TokenError> {
        let mut segments = token.splitn(3, '.');
        let (Some(header), Some(payload), Some(signature)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(TokenError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        };

        if header.is_empty() || payload.is_empty() {
            return Err(TokenError::Malformed("empty header or payload".to_string()));
        }

        let header_json = Base64UrlUnpadded::decode_vec(header)
            .map_err(|_| TokenError::Malformed("header is not base64url".to_string()))?;
        let header_value: serde_json::Value = serde_json::from_slice(&header_json)
            .map_err(|_| TokenError::Malformed("header is not JSON".to_string()))?;
        let alg = header_value
            .get("alg")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| TokenError::Malformed("header has no `alg`".to_string()))?;

        match alg.parse::<Algorithm>() {
            Ok(parsed) if parsed == self.algorithm => {}
            _ => {
                return Err(TokenError::Unsupported(format!(
                    "algorithm `{alg}` is not accepted"
                )))
            }
        }

        Base64UrlUnpadded::decode_vec(payload)
            .map_err(|_| TokenError::Malformed("payload is not base64url".to_string()))?;

        // Everything after the second dot is signature, stray dots included.
        if signature.is_empty() || !signature.bytes().all(is_base64url) {
            return Err(TokenError::BadSignature);
        }

        Ok(())
    }
}

fn is_base64url(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Map a `jsonwebtoken` failure onto the token taxonomy.
///
/// Header and payload encodings were checked beforehand, so a base64 failure
/// here can only come from the signature segment.
fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::Base64(_) => TokenError::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::Unsupported("algorithm is not accepted".to_string())
        }
        ErrorKind::Json(e) => TokenError::Malformed(format!("claims are invalid: {e}")),
        other => TokenError::Malformed(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{principal_claims, ClaimMap};
    use crate::auth::TokenCodec;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W";
    const ISSUER: &str = "stateless-auth";
    const NOW: i64 = 1_700_000_000_000;

    fn secret() -> SecretKey {
        SecretKey::new(SECRET).unwrap()
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(&secret(), Algorithm::HS256, ISSUER)
    }

    fn validator() -> TokenValidator {
        TokenValidator::new(&secret(), Algorithm::HS256).with_issuer(ISSUER)
    }

    fn issue(ttl: Duration) -> String {
        codec()
            .issue("42", &principal_claims("alice", ["ROLE_USER"]), NOW, ttl)
            .unwrap()
    }

    fn craft(header: &str, payload: &str, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload),
            signature
        )
    }

    #[test]
    fn round_trip_preserves_subject_and_roles() {
        let token = issue(Duration::from_secs(60));
        let claims = validator().parse_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.roles(), vec!["ROLE_USER"]);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let ttl = Duration::from_millis(1000);
        let token = issue(ttl);
        let v = validator();

        assert!(v.validate_at(&token, NOW + 999));
        assert_eq!(
            v.parse_at(&token, NOW + 1000),
            Err(TokenError::Expired {
                expired_at: NOW + 1000
            })
        );
        assert!(!v.validate_at(&token, NOW + 1001));
    }

    #[test]
    fn subject_42_scenario() {
        let token = issue(Duration::from_millis(1000));
        let v = validator();

        let claims = v.parse_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, "42");

        let err = v.parse_at(&token, NOW + 1001).unwrap_err();
        assert_eq!(err.error_code(), "expired_token");
    }

    #[test]
    fn leeway_extends_acceptance_window() {
        let token = issue(Duration::from_millis(1000));
        let v = validator().with_leeway(Duration::from_millis(500));
        assert!(v.validate_at(&token, NOW + 1499));
        assert!(!v.validate_at(&token, NOW + 1500));
    }

    #[test]
    fn any_signature_bit_flip_is_a_bad_signature() {
        let token = issue(Duration::from_secs(60));
        let (signed, signature) = token.rsplit_once('.').unwrap();
        let raw = Base64UrlUnpadded::decode_vec(signature).unwrap();
        let v = validator();

        for byte in 0..raw.len() {
            for bit in 0..8 {
                let mut tampered = raw.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!("{signed}.{}", Base64UrlUnpadded::encode_string(&tampered));
                assert_eq!(
                    v.parse_at(&forged, NOW),
                    Err(TokenError::BadSignature),
                    "byte {byte} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn any_bit_flip_in_encoded_signature_is_a_bad_signature() {
        let v = validator();
        for subject in ["1", "42", "alice", "service-account-7"] {
            let token = codec()
                .issue(subject, &ClaimMap::new(), NOW, Duration::from_secs(60))
                .unwrap();
            let signature_start = token.rfind('.').unwrap() + 1;

            for pos in signature_start..token.len() {
                for bit in 0..7 {
                    let mut bytes = token.clone().into_bytes();
                    bytes[pos] ^= 1 << bit;
                    let forged = String::from_utf8(bytes).unwrap();
                    assert_eq!(
                        v.parse_at(&forged, NOW),
                        Err(TokenError::BadSignature),
                        "subject {subject} pos {pos} bit {bit}: {forged}"
                    );
                }
            }
        }
    }

    #[test]
    fn dot_inside_signature_is_a_bad_signature() {
        let token = issue(Duration::from_secs(60));
        let forged = format!("{token}.extra");
        assert_eq!(
            validator().parse_at(&forged, NOW),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn expiry_not_after_issued_at_is_malformed() {
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        for exp in [1_700_000_000, 1_699_999_999] {
            let claims = serde_json::json!({
                "sub": "42",
                "iss": ISSUER,
                "iat": 1_700_000_000,
                "exp": exp,
            });
            let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();
            assert_eq!(
                validator().parse_at(&token, NOW - 10_000),
                Err(TokenError::Malformed(
                    "expiry is not after issued-at".to_string()
                )),
                "exp {exp}"
            );
        }
    }

    #[test]
    fn header_without_alg_is_malformed() {
        let token = craft(
            r#"{"typ":"JWT"}"#,
            r#"{"sub":"42","iss":"stateless-auth","iat":1700000000,"exp":9999999999}"#,
            "c2lnbmF0dXJl",
        );
        assert_eq!(
            validator().parse_at(&token, NOW),
            Err(TokenError::Malformed("header has no `alg`".to_string()))
        );
    }

    #[test]
    fn tampered_payload_is_a_bad_signature() {
        let token = issue(Duration::from_secs(60));
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            r#"{"sub":"1","iss":"stateless-auth","iat":1700000000,"exp":9999999999}"#,
        );
        parts[1] = &forged_payload;
        assert_eq!(
            validator().parse_at(&parts.join("."), NOW),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let other = SecretKey::new("y9K$mP2vRx#TnZ@s4Yw!cGf7Dh&e3Xa6").unwrap();
        let token = TokenCodec::new(&other, Algorithm::HS256, ISSUER)
            .issue("42", &ClaimMap::new(), NOW, Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            validator().parse_at(&token, NOW),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let v = validator();
        for token in ["", "abc", "a.b", "a.b.c.d", "..", "not a token"] {
            assert!(
                matches!(v.parse_at(token, NOW), Err(TokenError::Malformed(_))),
                "{token:?}"
            );
        }
    }

    #[test]
    fn garbage_header_is_malformed() {
        let token = format!("!!!.{}.sig", URL_SAFE_NO_PAD.encode("{}"));
        assert!(matches!(
            validator().parse_at(&token, NOW),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn unsigned_token_is_unsupported() {
        let token = craft(
            r#"{"alg":"none","typ":"JWT"}"#,
            r#"{"sub":"42","iss":"stateless-auth","iat":1700000000,"exp":9999999999}"#,
            "",
        );
        assert!(matches!(
            validator().parse_at(&token, NOW),
            Err(TokenError::Unsupported(_))
        ));
    }

    #[test]
    fn asymmetric_algorithm_is_unsupported() {
        let token = craft(
            r#"{"alg":"RS256","typ":"JWT"}"#,
            r#"{"sub":"42","iss":"stateless-auth","iat":1700000000,"exp":9999999999}"#,
            "fake_signature",
        );
        assert!(matches!(
            validator().parse_at(&token, NOW),
            Err(TokenError::Unsupported(_))
        ));
    }

    #[test]
    fn other_hmac_strength_is_unsupported() {
        let token = TokenCodec::new(&secret(), Algorithm::HS512, ISSUER)
            .issue("42", &ClaimMap::new(), NOW, Duration::from_secs(60))
            .unwrap();
        assert!(matches!(
            validator().parse_at(&token, NOW),
            Err(TokenError::Unsupported(_))
        ));
    }

    #[test]
    fn foreign_issuer_is_unsupported_only_when_checked() {
        let token = TokenCodec::new(&secret(), Algorithm::HS256, "someone-else")
            .issue("42", &ClaimMap::new(), NOW, Duration::from_secs(60))
            .unwrap();
        assert!(matches!(
            validator().parse_at(&token, NOW),
            Err(TokenError::Unsupported(_))
        ));

        let lenient = TokenValidator::new(&secret(), Algorithm::HS256);
        assert!(lenient.validate_at(&token, NOW));
    }

    #[test]
    fn expiry_is_checked_before_issuer() {
        let token = TokenCodec::new(&secret(), Algorithm::HS256, "someone-else")
            .issue("42", &ClaimMap::new(), NOW, Duration::from_millis(10))
            .unwrap();
        assert!(matches!(
            validator().parse_at(&token, NOW + 10),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn wall_clock_helpers_accept_fresh_tokens() {
        let now = now_millis();
        let token = codec()
            .issue("42", &ClaimMap::new(), now, Duration::from_secs(60))
            .unwrap();
        let v = validator();
        assert!(v.validate(&token));
        assert_eq!(v.subject(&token).unwrap(), "42");
        assert_eq!(v.expiration(&token).unwrap().timestamp_millis(), now + 60_000);
    }
}
