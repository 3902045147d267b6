// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::{Arc, OnceLock};

use crate::auth::{
    claims::principal_claims,
    password::{hash_password, verify_password},
    principal::{CredentialStore, Principal, PrincipalLookup},
    AuthError, TokenCodec, TokenPair, TokenValidator,
};
use crate::config::AuthSettings;

/// Shared, read-only authentication components.
pub struct AuthState {
    pub settings: AuthSettings,
    pub codec: TokenCodec,
    pub validator: TokenValidator,
    pub store: Arc<dyn CredentialStore>,
    dummy_hash: OnceLock<Option<String>>,
}

impl AuthState {
    pub fn new(settings: AuthSettings, store: Arc<dyn CredentialStore>) -> Self {
        let codec = TokenCodec::new(&settings.secret, settings.algorithm, settings.issuer.clone());
        let mut validator = TokenValidator::new(&settings.secret, settings.algorithm)
            .with_leeway(settings.clock_skew_leeway);
        if settings.check_issuer {
            validator = validator.with_issuer(settings.issuer.clone());
        }

        Self {
            settings,
            codec,
            validator,
            store,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Spend one password verification on an unknown username so the
    /// response time does not reveal which usernames exist.
    pub fn verify_unknown_principal(&self, password: &str) {
        let hash = self.dummy_hash.get_or_init(|| {
            hash_password("unknown-principal")
                .inspect_err(|e| {
                    tracing::error!(error = %e, "Could not build placeholder credential hash")
                })
                .ok()
        });
        if let Some(hash) = hash {
            let _ = verify_password(password, hash);
        }
    }

    #[cfg(test)]
    pub(crate) fn has_placeholder_hash(&self) -> bool {
        matches!(self.dummy_hash.get(), Some(Some(_)))
    }

    /// Look up a principal, bounded by the configured timeout.
    pub async fn find_principal(
        &self,
        lookup: PrincipalLookup,
        key: &str,
    ) -> Result<Option<Principal>, AuthError> {
        let timeout = self.settings.principal_lookup_timeout;
        tokio::time::timeout(timeout, lookup.find(self.store.as_ref(), key))
            .await
            .map_err(|_| {
                AuthError::StoreUnavailable(format!(
                    "lookup timed out after {} ms",
                    timeout.as_millis()
                ))
            })?
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }

    /// Resolve a token subject to an enabled principal.
    pub async fn resolve_subject(&self, subject: &str) -> Result<Principal, AuthError> {
        let principal = self
            .find_principal(self.settings.principal_lookup, subject)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if !principal.enabled {
            return Err(AuthError::PrincipalDisabled);
        }
        Ok(principal)
    }

    /// Issue an access/refresh pair for `principal` as of `now` (epoch ms).
    pub fn issue_tokens(&self, principal: &Principal, now: i64) -> Result<TokenPair, AuthError> {
        let subject = self.settings.principal_lookup.subject_of(principal);
        let claims = principal_claims(&principal.username, &principal.roles);
        self.codec
            .issue_pair(
                subject,
                &claims,
                now,
                self.settings.access_token_ttl,
                self.settings.refresh_token_ttl,
            )
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthState>,
}

impl AppState {
    pub fn new(settings: AuthSettings, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            auth: Arc::new(AuthState::new(settings, store)),
        }
    }
}
