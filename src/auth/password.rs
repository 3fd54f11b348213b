//! Argon2id password hashing.

use crate::config::Config;
use argon2::password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::Arc;
use zeroize::Zeroizing;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Hashing failed: {0}")]
    Hashing(String),

    #[error("Malformed password hash: {0}")]
    Malformed(String),

    #[error("Hashing task failed: {0}")]
    Task(String),
}

/// Salts, hashes and verifies passwords.
///
/// Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so
/// verification reads its cost from the hash rather than from `self`.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Hash of a throwaway password, verified against when a login names an
    /// unknown account.
    dummy_hash: Arc<str>,
}

impl CredentialHasher {
    /// Build a hasher with the given Argon2id cost.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = CredentialHasher {
            argon2,
            dummy_hash: Arc::from(""),
        };
        hasher.dummy_hash = Arc::from(hasher.hash("postgate-dummy-password")?);
        Ok(hasher)
    }

    pub fn from_config(config: &Config) -> Result<Self, HashError> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// # Returns
    /// * `Ok(true)` if the password matches
    /// * `Ok(false)` if it does not
    /// * `Err(HashError::Malformed)` if the stored hash cannot be parsed
    pub fn verify(&self, hash: &str, password: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError::Malformed(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Malformed(e.to_string())),
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_password(&self, password: Zeroizing<String>) -> Result<String, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashError::Task(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_password(
        &self,
        hash: String,
        password: Zeroizing<String>,
    ) -> Result<bool, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|e| HashError::Task(e.to_string()))?
    }

    /// Spend one verification's worth of work and discard the result.
    pub async fn verify_dummy(&self, password: Zeroizing<String>) {
        let dummy = self.dummy_hash.to_string();
        let _ = self.verify_password(dummy, password).await;
    }
}
