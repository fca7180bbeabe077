//! Argon2id password hashing.

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};

/// Errors returned by [`PasswordHasher`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
    #[error("stored password hash is invalid: {0}")]
    InvalidHash(String),
}

/// Hashes and verifies passwords as PHC strings.
///
/// Holds a hash of a random throwaway password so that a lookup miss can be
/// verified against it, giving unknown-email and wrong-password logins the
/// same cost.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    decoy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new() -> Result<Self, PasswordError> {
        let argon2 = Argon2::default();
        let decoy = SaltString::generate(&mut OsRng);
        let decoy_hash = hash_with(&argon2, decoy.as_str())?;
        Ok(Self {
            argon2,
            decoy_hash: decoy_hash.into(),
        })
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, password)
    }

    /// Verify `password` against a stored PHC hash.
    ///
    /// The comparison inside argon2 is constant-time.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Burn one verification against the decoy hash. Always returns `false`.
    pub fn verify_decoy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.decoy_hash);
        false
    }
}

fn hash_with(argon2: &Argon2<'static>, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}
