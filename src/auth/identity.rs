// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped security context.
//!
//! The interceptor stores a [`SecurityContext`] in the request's extensions.
//! It is owned by that request and dropped with it, so an identity can never
//! outlive the request it was established for.

use std::collections::BTreeSet;

use serde::Serialize;
use utoipa::ToSchema;

use super::principal::Principal;

/// The principal a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedIdentity {
    pub principal_id: String,
    pub username: String,
    pub roles: BTreeSet<String>,
}

impl AuthenticatedIdentity {
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            principal_id: principal.id.clone(),
            username: principal.username.clone(),
            roles: principal.roles.clone(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Outcome of the authentication phase for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SecurityContext {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedIdentity),
}

impl SecurityContext {
    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        match self {
            SecurityContext::Anonymous => None,
            SecurityContext::Authenticated(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SecurityContext::Authenticated(_))
    }
}
