// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principals and the credential store seam.
//!
//! The store is owned elsewhere; this crate only reads principals through
//! [`CredentialStore`]. [`InMemoryCredentialStore`] backs development runs
//! and tests.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::password::{hash_password, PasswordError};
use super::roles::normalize_roles;

/// A stored user or service account.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque identifier, used as the token subject by default
    pub id: String,
    /// Login name, also shown as display name
    pub username: String,
    credential_hash: String,
    /// Role names (non-empty, unique)
    pub roles: BTreeSet<String>,
    pub enabled: bool,
}

impl Principal {
    pub fn new<I, R>(
        id: impl Into<String>,
        username: impl Into<String>,
        credential_hash: impl Into<String>,
        roles: I,
    ) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        Self {
            id: id.into(),
            username: username.into(),
            credential_hash: credential_hash.into(),
            roles: normalize_roles(roles),
            enabled: true,
        }
    }

    /// Mark the principal as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Stored PHC hash. Never log this.
    pub fn credential_hash(&self) -> &str {
        &self.credential_hash
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("credential_hash", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to stored principals.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError>;
}

/// Which principal attribute a token subject refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrincipalLookup {
    #[default]
    Id,
    Username,
}

impl PrincipalLookup {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "id" => Some(PrincipalLookup::Id),
            "username" => Some(PrincipalLookup::Username),
            _ => None,
        }
    }

    /// The subject to put in tokens issued for `principal`.
    pub fn subject_of<'a>(&self, principal: &'a Principal) -> &'a str {
        match self {
            PrincipalLookup::Id => &principal.id,
            PrincipalLookup::Username => &principal.username,
        }
    }

    pub async fn find(
        &self,
        store: &dyn CredentialStore,
        subject: &str,
    ) -> Result<Option<Principal>, StoreError> {
        match self {
            PrincipalLookup::Id => store.find_by_id(subject).await,
            PrincipalLookup::Username => store.find_by_username(subject).await,
        }
    }
}

/// Development account description (`id:username:password:ROLE_A+ROLE_B`).
#[derive(Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub id: String,
    pub username: String,
    pub password: String,
    pub roles: Vec<String>,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Principals held in memory, keyed by id.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    principals: RwLock<HashMap<String, Principal>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principals(principals: impl IntoIterator<Item = Principal>) -> Self {
        Self {
            principals: RwLock::new(
                principals
                    .into_iter()
                    .map(|p| (p.id.clone(), p))
                    .collect(),
            ),
        }
    }

    /// Build a store from seed users, hashing their passwords.
    pub fn seeded(users: &[SeedUser]) -> Result<Self, PasswordError> {
        let principals = users
            .iter()
            .map(|user| {
                let hash = hash_password(&user.password)?;
                Ok(Principal::new(&user.id, &user.username, hash, &user.roles))
            })
            .collect::<Result<Vec<_>, PasswordError>>()?;
        Ok(Self::with_principals(principals))
    }

    pub async fn len(&self) -> usize {
        self.principals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.principals.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.principals.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .principals
            .read()
            .await
            .values()
            .find(|p| p.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal::new("42", "alice", "$argon2id$stub", ["ROLE_USER", "ROLE_USER", ""])
    }

    #[test]
    fn roles_are_normalized() {
        let p = alice();
        assert_eq!(p.roles.len(), 1);
        assert!(p.has_role("ROLE_USER"));
        assert!(!p.has_role("ROLE_ADMIN"));
    }

    #[test]
    fn debug_hides_credential_hash() {
        let rendered = format!("{:?}", alice());
        assert!(!rendered.contains("argon2"));
        assert!(rendered.contains("alice"));
    }

    #[test]
    fn lookup_parsing() {
        assert_eq!(PrincipalLookup::parse("ID"), Some(PrincipalLookup::Id));
        assert_eq!(
            PrincipalLookup::parse(" username "),
            Some(PrincipalLookup::Username)
        );
        assert_eq!(PrincipalLookup::parse("email"), None);
    }

    #[test]
    fn subject_follows_lookup_mode() {
        let p = alice();
        assert_eq!(PrincipalLookup::Id.subject_of(&p), "42");
        assert_eq!(PrincipalLookup::Username.subject_of(&p), "alice");
    }

    #[tokio::test]
    async fn finds_by_id_and_username() {
        let store = InMemoryCredentialStore::with_principals([alice()]);
        assert_eq!(store.find_by_id("42").await.unwrap(), Some(alice()));
        assert_eq!(store.find_by_username("alice").await.unwrap(), Some(alice()));
        assert_eq!(store.find_by_id("alice").await.unwrap(), None);

        let by_name = PrincipalLookup::Username.find(&store, "alice").await.unwrap();
        assert_eq!(by_name.map(|p| p.id), Some("42".to_string()));
    }

    #[tokio::test]
    async fn later_principal_with_same_id_wins() {
        assert!(InMemoryCredentialStore::new().is_empty().await);
        let store = InMemoryCredentialStore::with_principals([alice(), alice().disabled()]);
        assert_eq!(store.len().await, 1);
        assert!(!store.find_by_id("42").await.unwrap().unwrap().enabled);
    }

    #[tokio::test]
    async fn seeded_store_hashes_passwords() {
        let store = InMemoryCredentialStore::seeded(&[SeedUser {
            id: "1".into(),
            username: "user".into(),
            password: "password".into(),
            roles: vec!["ROLE_USER".into()],
        }])
        .unwrap();
        let user = store.find_by_username("user").await.unwrap().unwrap();
        assert_ne!(user.credential_hash(), "password");
        assert!(crate::auth::password::verify_password("password", user.credential_hash()).unwrap());
    }
}
