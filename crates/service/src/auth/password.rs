use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHash, Version,
};
use rand::rngs::OsRng;

use super::errors::AuthError;

/// Adaptive password hashing capability injected into the engine.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;
    /// A malformed stored hash simply fails verification.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

/// argon2id with a random per-hash salt.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        self.argon.verify_password(password.as_bytes(), &parsed).is_ok()
    }
}
