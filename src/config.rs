//! Process configuration
//! Mission: Read every setting once at startup; nothing is re-read per request

use crate::auth::password::DEFAULT_BCRYPT_COST;
use std::env;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_JWT_SECRET: &str = "s3cr3t";
pub const DEFAULT_JWT_ISSUER: &str = "postboard";
pub const DEFAULT_DB_PATH: &str = "postboard.db";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub db_path: String,
    pub bcrypt_cost: u32,
    pub admin_password: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("db_path", &self.db_path)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            db_path: DEFAULT_DB_PATH.to_string(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AppConfig {
    /// Build from `POSTBOARD_*` environment variables (load `.env` first).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset or empty values take the default; unparseable numbers too.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let jwt_secret = match get("POSTBOARD_JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("⚠️  POSTBOARD_JWT_SECRET not set, using the built-in development secret");
                defaults.jwt_secret
            }
        };

        Self {
            port: get("POSTBOARD_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            jwt_secret,
            jwt_issuer: get("POSTBOARD_JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            db_path: get("POSTBOARD_DB_PATH").unwrap_or(defaults.db_path),
            bcrypt_cost: get("POSTBOARD_BCRYPT_COST")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.bcrypt_cost),
            admin_password: get("POSTBOARD_ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
        }
    }
}
