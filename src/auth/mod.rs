//! Authentication Module
//! Mission: Credential verification, signed tokens, and request-time RBAC

pub mod error;
pub mod jwt;
pub mod login;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rbac;

pub use error::AuthError;
pub use jwt::{JwtHandler, TokenService, TOKEN_TTL_HOURS};
pub use login::LoginService;
pub use middleware::{auth_middleware, optional_auth_middleware, RequestContext};
pub use models::{Identity, Role, RoleSet};
pub use password::{BcryptHasher, PasswordHasher};
pub use rbac::{authorize, require_all_roles, require_any_role, RoleRequirement};
