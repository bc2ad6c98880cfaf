// Password hashing and verification service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::auth::error::AuthError;
use crate::config::HashSettings;

/// Password service for hashing and verification
///
/// Digests are Argon2id PHC strings; the salt and cost parameters travel
/// inside the digest, so a digest produced under older settings still
/// verifies after the configured cost is raised.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordService {
    /// Create a password service with the given Argon2id cost
    pub fn new(settings: HashSettings) -> Result<Self, AuthError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| AuthError::Dependency(format!("invalid Argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "dummy password for unknown accounts")?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        hash_with(&self.argon2, password)
    }

    /// Verify a password against a stored digest
    ///
    /// `Ok(false)` means the password does not match. A digest that cannot be
    /// parsed is a storage problem and is reported as an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Dependency(format!("stored digest is malformed: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Dependency(format!(
                "password verification failed: {}",
                e
            ))),
        }
    }

    /// Burn one verification against a fixed digest
    ///
    /// Used when the account does not exist so that an unknown email costs
    /// the same as a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify_password(password, &self.dummy_hash);
    }

    /// Hash on the blocking thread pool
    pub async fn hash_password_blocking(&self, password: String) -> Result<String, AuthError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash_password(&password))
            .await
            .map_err(|e| AuthError::Dependency(format!("hashing task failed: {}", e)))?
    }

    /// Verify on the blocking thread pool; `None` verifies against the dummy digest
    pub async fn verify_password_blocking(
        &self,
        password: String,
        hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || match hash {
            Some(hash) => service.verify_password(&password, &hash),
            None => {
                service.verify_dummy(&password);
                Ok(false)
            }
        })
        .await
        .map_err(|e| AuthError::Dependency(format!("verification task failed: {}", e)))?
    }
}

fn hash_with(argon2: &Argon2<'static>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Dependency(format!("password hashing failed: {}", e)))
}
