// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        identity::AuthenticatedIdentity,
        middleware::{authenticate, enforce_authentication, enforce_role, RequiredRole},
        TokenPair, ROLE_MODERATOR,
    },
    error::ErrorBody,
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

/// Build the application router.
///
/// Request flow, outermost first: request id, tracing, [`authenticate`],
/// [`enforce_authentication`], then the route (and its role gate, if any).
pub fn router(state: AppState) -> Router {
    let moderation = Router::new()
        .route("/api/moderation/queue", get(admin::moderation_queue))
        .route_layer(middleware::from_fn_with_state(
            RequiredRole(ROLE_MODERATOR),
            enforce_role,
        ));

    let api = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/users/me", get(users::get_current_user))
        .route("/api/admin/ping", get(admin::ping))
        .route("/api/public/health", get(health::liveness))
        .route("/api/public/health/ready", get(health::readiness))
        .merge(moderation)
        .with_state(state.clone());

    Router::new()
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/v3/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_authentication,
        ))
        .layer(middleware::from_fn_with_state(state, authenticate))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::refresh,
        users::get_current_user,
        admin::ping,
        admin::moderation_queue,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::RefreshTokenRequest,
            TokenPair,
            ErrorBody,
            AuthenticatedIdentity,
            users::UserMeResponse,
            admin::AdminPingResponse,
            admin::ModerationQueueResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issuance and refresh"),
        (name = "Users", description = "Current principal"),
        (name = "Admin", description = "Role-protected endpoints"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
