use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::{config::PasswordHashConfig, error::AppError};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password hash is malformed: {0}")]
    Verification(String),
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        AppError::Internal(err.into())
    }
}

/// Plaintext behind the hash verified when a login names no known user.
const DUMMY_PASSWORD: &str = "liftlog-dummy-password";

/// Argon2id hasher configured with the current work factor.
#[derive(Clone)]
pub struct PasswordCodec {
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

impl PasswordCodec {
    pub fn new(cfg: &PasswordHashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let mut codec = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: Arc::from(""),
            #[cfg(test)]
            verifications: Arc::default(),
        };
        codec.dummy_hash = codec.hash(DUMMY_PASSWORD)?.into();
        Ok(codec)
    }

    /// Spends the same work as `verify` against a real hash, for callers
    /// that have no stored hash to check.
    pub fn verify_dummy(&self, plain: &str) -> Result<(), CredentialError> {
        self.verify(&self.dummy_hash, plain).map(|_| ())
    }

    #[cfg(test)]
    pub(crate) fn verification_count(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }

    /// Returns a PHC string carrying algorithm, parameters and salt.
    pub fn hash(&self, plain: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                CredentialError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// A clean mismatch is `Ok(false)`; only an unparseable hash is an error.
    pub fn verify(&self, hash: &str, plain: &str) -> Result<bool, CredentialError> {
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::SeqCst);
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            CredentialError::Verification(e.to_string())
        })?;
        // verification re-derives with the parameters embedded in `parsed`
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(CredentialError::Verification(e.to_string()))
            }
        }
    }
}
