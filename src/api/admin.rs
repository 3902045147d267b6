// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role-protected endpoints.
//!
//! `/api/admin/ping` is gated by the [`AdminOnly`] extractor.
//! `/api/moderation/queue` is gated by the
//! [`enforce_role`](crate::auth::middleware::enforce_role) route layer, which
//! rejects before the handler runs; the handler reads the identity through
//! [`ModeratorOnly`].

use axum::Json;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AdminOnly, ModeratorOnly};

/// Response for GET /api/admin/ping
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPingResponse {
    pub status: String,
    /// Principal that made the call
    pub principal_id: String,
    /// Server time (RFC 3339)
    pub timestamp: String,
}

/// Response for GET /api/moderation/queue
#[derive(Debug, Serialize, ToSchema)]
pub struct ModerationQueueResponse {
    pub moderator: String,
    pub pending: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/admin/ping",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller holds ROLE_ADMIN", body = AdminPingResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Forbidden - ROLE_ADMIN required"),
    )
)]
pub async fn ping(admin: AdminOnly) -> Json<AdminPingResponse> {
    let identity = admin.into_inner();
    tracing::info!(principal_id = %identity.principal_id, "Admin ping");
    Json(AdminPingResponse {
        status: "ok".to_string(),
        principal_id: identity.principal_id,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[utoipa::path(
    get,
    path = "/api/moderation/queue",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller holds ROLE_MODERATOR", body = ModerationQueueResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 403, description = "Forbidden - ROLE_MODERATOR required"),
    )
)]
pub async fn moderation_queue(moderator: ModeratorOnly) -> Json<ModerationQueueResponse> {
    let identity = moderator.into_inner();
    Json(ModerationQueueResponse {
        moderator: identity.username,
        pending: Vec::new(),
    })
}
