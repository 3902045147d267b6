// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate.
//!
//! [`require_role`] is the decision function. The extractors apply it to the
//! [`SecurityContext`] placed in the request by the
//! [`authenticate`](super::middleware::authenticate) middleware:
//!
//! ```rust,ignore
//! async fn me(Authenticated(identity): Authenticated) -> impl IntoResponse {
//!     // any authenticated principal
//! }
//!
//! async fn stats(AdminOnly(identity, _): AdminOnly) -> impl IntoResponse {
//!     // principals holding ROLE_ADMIN only
//! }
//! ```

use std::convert::Infallible;
use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::identity::{AuthenticatedIdentity, SecurityContext};
use super::roles::{AdminRole, ModeratorRole, RoleMarker, UserRole};
use super::AuthError;

/// Allow iff an identity is present and holds `role`.
///
/// Absent identity is `Unauthenticated` (401); present but lacking the role
/// is `Forbidden` (403).
pub fn require_role(identity: Option<&AuthenticatedIdentity>, role: &str) -> Result<(), AuthError> {
    let identity = identity.ok_or(AuthError::Unauthenticated)?;
    if identity.has_role(role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            required_role: role.to_string(),
        })
    }
}

fn identity_from_parts(parts: &Parts) -> Option<AuthenticatedIdentity> {
    parts
        .extensions
        .get::<SecurityContext>()
        .and_then(SecurityContext::identity)
        .cloned()
}

/// Extractor for any authenticated principal.
pub struct Authenticated(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)
            .map(Authenticated)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Extractor that requires the role named by `R`.
pub struct RequireRole<R: RoleMarker>(pub AuthenticatedIdentity, pub PhantomData<R>);

impl<R: RoleMarker> RequireRole<R> {
    pub fn into_inner(self) -> AuthenticatedIdentity {
        self.0
    }
}

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleMarker,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = identity_from_parts(parts);
        require_role(identity.as_ref(), R::ROLE)?;
        let identity = identity.ok_or(AuthError::Unauthenticated)?;
        Ok(RequireRole(identity, PhantomData))
    }
}

/// Requires `ROLE_USER`.
pub type UserOnly = RequireRole<UserRole>;
/// Requires `ROLE_ADMIN`.
pub type AdminOnly = RequireRole<AdminRole>;
/// Requires `ROLE_MODERATOR`.
pub type ModeratorOnly = RequireRole<ModeratorRole>;

/// Identity if present; never rejects.
pub struct OptionalIdentity(pub Option<AuthenticatedIdentity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(identity_from_parts(parts)))
    }
}
