// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Authenticated, AuthenticatedIdentity};

/// Response for GET /api/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// Principal identifier
    pub id: String,
    pub username: String,
    /// Roles held by the principal, sorted
    pub roles: Vec<String>,
}

impl From<AuthenticatedIdentity> for UserMeResponse {
    fn from(identity: AuthenticatedIdentity) -> Self {
        Self {
            id: identity.principal_id,
            username: identity.username,
            roles: identity.roles.into_iter().collect(),
        }
    }
}

/// Get the current authenticated principal.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Principal information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Authenticated(identity): Authenticated) -> Json<UserMeResponse> {
    Json(identity.into())
}
