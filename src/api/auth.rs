// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token endpoints: credential login and refresh.

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::{
        password::verify_password, validator::now_millis, AuthError, PrincipalLookup, TokenError,
        TokenPair, TokenUse,
    },
    error::{ApiError, ApiJson, ErrorBody},
    state::AppState,
};

/// Request body for POST /api/auth/login
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for POST /api/auth/refresh
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Exchange a username and password for a token pair.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = TokenPair),
        (status = 400, description = "Body is not valid JSON, or username or password missing", body = ErrorBody),
        (status = 401, description = "Invalid credentials or disabled account", body = ErrorBody),
        (status = 503, description = "Credential store unavailable", body = ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let auth = &state.auth;
    let Some(principal) = auth
        .find_principal(PrincipalLookup::Username, username)
        .await?
    else {
        auth.verify_unknown_principal(&request.password);
        tracing::info!(username, "Login rejected: unknown username");
        return Err(AuthError::InvalidCredentials.into());
    };

    match verify_password(&request.password, principal.credential_hash()) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(username, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => {
            tracing::error!(principal_id = %principal.id, error = %e, "Stored credential hash is unusable");
            return Err(AuthError::InvalidCredentials.into());
        }
    }

    if !principal.enabled {
        tracing::info!(principal_id = %principal.id, "Login rejected: principal disabled");
        return Err(AuthError::PrincipalDisabled.into());
    }

    let pair = auth.issue_tokens(&principal, now_millis())?;
    tracing::info!(principal_id = %principal.id, "Issued token pair");
    Ok(Json(pair))
}

/// Exchange a refresh token for a new token pair.
///
/// Roles are re-read from the credential store, so role changes take effect
/// on the next refresh.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenPair),
        (status = 400, description = "Body is not valid JSON", body = ErrorBody),
        (status = 401, description = "Refresh token rejected", body = ErrorBody),
        (status = 503, description = "Credential store unavailable", body = ErrorBody),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let auth = &state.auth;
    let claims = auth
        .validator
        .parse(request.refresh_token.trim())
        .map_err(AuthError::from)?;

    if claims.token_use != Some(TokenUse::Refresh) {
        return Err(AuthError::from(TokenError::Unsupported("not a refresh token".to_string())).into());
    }

    let principal = auth.resolve_subject(&claims.sub).await?;
    let pair = auth.issue_tokens(&principal, now_millis())?;
    tracing::debug!(principal_id = %principal.id, "Refreshed token pair");
    Ok(Json(pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{password::hash_password, InMemoryCredentialStore, Principal, SecretKey};
    use crate::config::AuthSettings;
    use std::sync::Arc;

    fn state() -> AppState {
        let hash = hash_password("s3cret-pass").unwrap();
        let store = InMemoryCredentialStore::with_principals([Principal::new(
            "42",
            "alice",
            hash,
            ["ROLE_USER"],
        )]);
        let settings =
            AuthSettings::new(SecretKey::new("J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W").unwrap());
        AppState::new(settings, Arc::new(store))
    }

    fn credentials(username: &str, password: &str) -> ApiJson<LoginRequest> {
        ApiJson(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn unknown_username_still_verifies_a_hash() {
        let state = state();
        let err = login(State(state.clone()), credentials("nobody", "guess"))
            .await
            .err()
            .unwrap();

        assert_eq!(err.error_code, "invalid_credentials");
        assert!(state.auth.has_placeholder_hash());
    }

    #[tokio::test]
    async fn unknown_and_wrong_password_are_indistinguishable() {
        let state = state();
        let unknown = login(State(state.clone()), credentials("nobody", "guess"))
            .await
            .err()
            .unwrap();
        let wrong = login(State(state), credentials("alice", "guess"))
            .await
            .err()
            .unwrap();

        assert_eq!(unknown.status, wrong.status);
        assert_eq!(unknown.error_code, wrong.error_code);
        assert_eq!(unknown.message, wrong.message);
    }

    #[tokio::test]
    async fn correct_password_issues_pair() {
        let Json(pair) = login(State(state()), credentials("alice", "s3cret-pass"))
            .await
            .unwrap();
        assert_eq!(pair.token_type, "Bearer");
    }
}
