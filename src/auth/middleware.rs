// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication interceptor and route gates for Axum.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/api/users/me", get(me))
//!     .layer(middleware::from_fn_with_state(state.clone(), enforce_authentication))
//!     .layer(middleware::from_fn_with_state(state, authenticate));
//! ```
//!
//! Layers added last run first, so [`authenticate`] establishes the
//! [`SecurityContext`] before [`enforce_authentication`] inspects it.
//!
//! [`authenticate`] never rejects a request. A missing, invalid or
//! unresolvable token leaves the request anonymous; whether anonymous is
//! acceptable is decided per route by the gates.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::claims::TokenUse;
use super::extractor::require_role;
use super::identity::{AuthenticatedIdentity, SecurityContext};
use super::{AuthError, TokenError};
use crate::state::{AppState, AuthState};

/// Establish the request's [`SecurityContext`] and continue unconditionally.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = resolve_security_context(&state.auth, request.headers()).await;
    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Turn the request headers into a security context.
pub async fn resolve_security_context(auth: &AuthState, headers: &HeaderMap) -> SecurityContext {
    let settings = &auth.settings;
    let Some(token) = bearer_token(headers, &settings.header_name, &settings.token_prefix) else {
        return SecurityContext::Anonymous;
    };

    match authenticate_token(auth, token).await {
        Ok(identity) => {
            tracing::debug!(principal_id = %identity.principal_id, "Request authenticated");
            SecurityContext::Authenticated(identity)
        }
        Err(e) => {
            log_rejection(&e);
            SecurityContext::Anonymous
        }
    }
}

/// Extract the token from `header_name` if its value starts with `prefix`.
pub fn bearer_token<'a>(
    headers: &'a HeaderMap,
    header_name: &HeaderName,
    prefix: &str,
) -> Option<&'a str> {
    let value = headers.get(header_name)?.to_str().ok()?;
    value.strip_prefix(prefix).map(str::trim)
}

async fn authenticate_token(
    auth: &AuthState,
    token: &str,
) -> Result<AuthenticatedIdentity, AuthError> {
    let claims = auth.validator.parse(token)?;
    if claims.token_use == Some(TokenUse::Refresh) {
        return Err(TokenError::Unsupported(
            "refresh token presented as a bearer credential".to_string(),
        )
        .into());
    }

    let principal = auth.resolve_subject(&claims.sub).await?;
    Ok(AuthenticatedIdentity::from_principal(&principal))
}

fn log_rejection(error: &AuthError) {
    match error {
        AuthError::Token(e) if e.is_expected() => {
            tracing::debug!(reason = %e, "Bearer token expired, continuing anonymously");
        }
        AuthError::Token(e) => {
            tracing::warn!(
                reason = %e,
                error_code = e.error_code(),
                "Bearer token rejected, continuing anonymously"
            );
        }
        AuthError::StoreUnavailable(_) | AuthError::Internal(_) => {
            tracing::error!(
                error = %error,
                "Could not resolve principal, continuing anonymously"
            );
        }
        other => {
            tracing::warn!(
                error_code = other.error_code(),
                "Token subject not usable, continuing anonymously"
            );
        }
    }
}

/// Require an identity on every path not listed as public.
pub async fn enforce_authentication(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.auth.settings.public_paths.matches(request.uri().path()) {
        return next.run(request).await;
    }

    let authenticated = request
        .extensions()
        .get::<SecurityContext>()
        .is_some_and(SecurityContext::is_authenticated);

    if !authenticated {
        tracing::debug!(path = %request.uri().path(), "Anonymous request to protected path");
        return AuthError::Unauthenticated.into_response();
    }

    next.run(request).await
}

/// Role required by [`enforce_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredRole(pub &'static str);

/// Route-layer gate: deny unless the identity holds the role.
///
/// ```rust,ignore
/// .route(
///     "/api/moderation/queue",
///     get(handler).route_layer(middleware::from_fn_with_state(
///         RequiredRole(ROLE_MODERATOR),
///         enforce_role,
///     )),
/// )
/// ```
pub async fn enforce_role(
    State(RequiredRole(role)): State<RequiredRole>,
    request: Request,
    next: Next,
) -> Response {
    let identity = request
        .extensions()
        .get::<SecurityContext>()
        .and_then(SecurityContext::identity);

    match require_role(identity, role) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
