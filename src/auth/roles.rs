// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role names and compile-time role markers.
//!
//! Roles are plain strings; authorization is set membership, with no
//! hierarchy. `ROLE_ADMIN` does not imply `ROLE_USER`.

use std::collections::BTreeSet;

/// Regular authenticated user.
pub const ROLE_USER: &str = "ROLE_USER";
/// Administrator.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
/// Content moderator.
pub const ROLE_MODERATOR: &str = "ROLE_MODERATOR";

/// A role known at compile time, used to parameterize
/// [`RequireRole`](super::extractor::RequireRole).
pub trait RoleMarker: Send + Sync + 'static {
    const ROLE: &'static str;
}

/// Marker for [`ROLE_USER`].
pub struct UserRole;
/// Marker for [`ROLE_ADMIN`].
pub struct AdminRole;
/// Marker for [`ROLE_MODERATOR`].
pub struct ModeratorRole;

impl RoleMarker for UserRole {
    const ROLE: &'static str = ROLE_USER;
}

impl RoleMarker for AdminRole {
    const ROLE: &'static str = ROLE_ADMIN;
}

impl RoleMarker for ModeratorRole {
    const ROLE: &'static str = ROLE_MODERATOR;
}

/// Trim role names, drop empty ones and deduplicate.
pub fn normalize_roles<I, R>(roles: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = R>,
    R: AsRef<str>,
{
    roles
        .into_iter()
        .map(|r| r.as_ref().trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}
