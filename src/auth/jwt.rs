//! JWT Token Handler
//! Mission: Issue and verify signed, time-bounded identity tokens

use crate::auth::{
    error::AuthError,
    models::{Claims, Identity},
};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use tracing::{debug, warn};

/// Fixed lifetime of every issued token
pub const TOKEN_TTL_HOURS: i64 = 48;

/// Only the symmetric HMAC family is ever accepted
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Issues tokens at login and verifies them on every protected request
pub trait TokenService: Send + Sync {
    fn issue_token(&self, identity: &Identity) -> Result<String>;
    fn verify_token(&self, token: &str) -> Result<Identity, AuthError>;
}

/// HS256 token handler keyed by a process-wide secret
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtHandler {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub(crate) fn issue_token_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .context("Invalid token expiry timestamp")?;

        let claims = Claims {
            sub: identity.subject_name.clone(),
            id: identity.subject_id,
            roles: identity.roles.names(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        debug!(
            "Issuing JWT for {} ({}), expires {}",
            identity.subject_name, identity.subject_id, expires_at
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign JWT")
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);
        validation
    }
}

impl TokenService for JwtHandler {
    fn issue_token(&self, identity: &Identity) -> Result<String> {
        self.issue_token_at(identity, Utc::now())
    }

    fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        let header = decode_header(token).map_err(|_| classify_undecodable_header(token))?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            warn!(alg = ?header.alg, "Rejecting token signed with non-HMAC algorithm");
            return Err(AuthError::InvalidSignature);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &Self::validation())
            .map_err(|e| classify(e.kind()))?;

        debug!("Validated JWT for {}", data.claims.sub);

        Ok(data.claims.into_identity())
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_) => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    }
}

/// `decode_header` only understands algorithms jsonwebtoken implements, so a
/// header naming `none` or an unknown scheme fails to parse. Such a header is
/// still well-formed; report it as a signature problem rather than garbage.
fn classify_undecodable_header(token: &str) -> AuthError {
    let Some(segment) = token.split('.').next() else {
        return AuthError::Malformed;
    };
    let Ok(raw) = URL_SAFE_NO_PAD.decode(segment) else {
        return AuthError::Malformed;
    };
    match serde_json::from_slice::<serde_json::Value>(&raw) {
        Ok(value) if value.get("alg").and_then(|a| a.as_str()).is_some() => {
            warn!(alg = ?value["alg"], "Rejecting token with unsupported algorithm");
            AuthError::InvalidSignature
        }
        _ => AuthError::Malformed,
    }
}
