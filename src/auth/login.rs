//! Login Service
//! Mission: Turn an identifier + secret into a verified identity

use crate::auth::{models::Identity, password::PasswordHasher};
use crate::store::CredentialStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies credentials against a credential store.
///
/// An unknown identifier and a wrong secret are indistinguishable to the
/// caller: both yield `Ok(None)` after a full hash verification.
#[derive(Clone)]
pub struct LoginService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl LoginService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Blocking: runs a bcrypt verification. Call from `spawn_blocking` in async code.
    pub fn login(&self, identifier: &str, secret: &str) -> Result<Option<Identity>> {
        let Some(account) = self.store.find_credential_by_identifier(identifier)? else {
            self.hasher.verify_dummy(secret);
            debug!("Login for unknown identifier {}", identifier);
            return Ok(None);
        };

        if !self.hasher.verify(&account.credential.secret_hash, secret) {
            warn!("Password mismatch for {}", identifier);
            return Ok(None);
        }

        Ok(Some(account.identity()))
    }
}
