// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless Auth - bearer-token authentication for Axum services
//!
//! Issues HMAC-signed JWTs, turns the bearer token on each request into a
//! request-scoped identity, and gates routes on authentication and roles.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, validator, interceptor and gates
//! - `config` - Environment configuration
//! - `state` - Shared application state
//! - `tls` - Optional HTTPS listener setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod tls;
