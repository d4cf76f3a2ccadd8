//! Credential Verifier
//! Mission: Salted, slow one-way hashing of secrets with bcrypt

use crate::auth::error::AuthError;
use tracing::{debug, error};

/// Work factor used when none is configured
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Hashing primitive behind login and registration
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext secret. The output is self-describing (algorithm,
    /// cost and salt are embedded).
    fn hash(&self, secret: &str) -> Result<String, AuthError>;

    /// Check a candidate against a stored hash. Malformed hashes verify as false.
    fn verify(&self, hash: &str, candidate: &str) -> bool;

    /// Burn roughly the same time as a real verification. Used when the
    /// identifier is unknown so both login failures look alike.
    fn verify_dummy(&self, candidate: &str);
}

/// bcrypt-backed hasher
pub struct BcryptHasher {
    cost: u32,
    dummy_hash: String,
}

impl BcryptHasher {
    /// Create a hasher. Fails only if the platform cannot produce a hash at
    /// all, which callers treat as fatal.
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        let cost = cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST);
        let dummy_hash = bcrypt::hash("postboard-dummy-secret", cost).map_err(|e| {
            error!("bcrypt self-check failed: {}", e);
            AuthError::HashingFailure
        })?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String, AuthError> {
        bcrypt::hash(secret, self.cost).map_err(|e| {
            error!("bcrypt hashing failed: {}", e);
            AuthError::HashingFailure
        })
    }

    fn verify(&self, hash: &str, candidate: &str) -> bool {
        match bcrypt::verify(candidate, hash) {
            Ok(valid) => valid,
            Err(e) => {
                debug!("Rejecting unverifiable password hash: {}", e);
                false
            }
        }
    }

    fn verify_dummy(&self, candidate: &str) {
        let _ = bcrypt::verify(candidate, &self.dummy_hash);
    }
}
