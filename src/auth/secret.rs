// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide HMAC signing secret.
//!
//! The secret is loaded once at startup and shared read-only by the
//! [`TokenCodec`](super::TokenCodec) and [`TokenValidator`](super::TokenValidator).
//! There is no rotation: the key lives as long as the process.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

/// Minimum secret length in bytes (256 bits, the HS256 key size).
pub const MIN_SECRET_LENGTH: usize = 32;

/// Errors raised while loading the signing secret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretKeyError {
    #[error("secret key must be at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },
}

/// Symmetric signing secret.
///
/// Cloning is cheap; all clones share the same bytes. `Debug` never prints
/// the key material.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Arc<[u8]>,
}

impl SecretKey {
    /// Load a secret, rejecting anything shorter than [`MIN_SECRET_LENGTH`].
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SecretKeyError> {
        let bytes = secret.as_ref();
        if bytes.len() < MIN_SECRET_LENGTH {
            return Err(SecretKeyError::TooShort {
                min: MIN_SECRET_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: Arc::from(bytes),
        })
    }

    /// Length of the key in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.bytes)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.bytes)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED; {} bytes])", self.bytes.len())
    }
}

/// Whether `algorithm` belongs to the HMAC-SHA family this crate signs with.
pub fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}
