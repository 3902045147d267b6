// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication backed by an HMAC-signed JWT.
//!
//! ## Auth Flow
//!
//! 1. Client posts credentials to `/api/auth/login` and receives an
//!    access/refresh [`TokenPair`]
//! 2. Client sends `Authorization: Bearer <access token>`
//! 3. The [`authenticate`](middleware::authenticate) middleware:
//!    - Checks the token's structure, signature and expiry
//!    - Resolves the `sub` claim through the [`CredentialStore`](principal::CredentialStore)
//!    - Stores a [`SecurityContext`] in the request extensions
//! 4. Gates decide per route:
//!    - [`enforce_authentication`](middleware::enforce_authentication) for every
//!      non-public path
//!    - [`Authenticated`], [`RequireRole`] and [`enforce_role`](middleware::enforce_role)
//!      for role checks
//!
//! ## Security
//!
//! - No server-side session state; the identity lives only for one request
//! - Only HMAC algorithms are accepted, and `alg` must match the configuration
//! - Refresh tokens are not accepted as bearer credentials
//! - Roles come from the credential store, not from the token

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod principal;
pub mod public_paths;
pub mod roles;
pub mod secret;
pub mod validator;

pub use claims::{ClaimMap, TokenClaims, TokenUse};
pub use codec::{TokenCodec, TokenPair};
pub use error::{AuthError, IssueError, TokenError};
pub use extractor::{
    require_role, AdminOnly, Authenticated, ModeratorOnly, OptionalIdentity, RequireRole,
    UserOnly,
};
pub use identity::{AuthenticatedIdentity, SecurityContext};
pub use principal::{CredentialStore, InMemoryCredentialStore, Principal, PrincipalLookup};
pub use roles::{ROLE_ADMIN, ROLE_MODERATOR, ROLE_USER};
pub use secret::SecretKey;
pub use validator::TokenValidator;
