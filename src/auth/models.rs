//! Authentication Models
//! Mission: Define the identity, role and token shapes that cross the trust boundary

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Fixed set of roles a principal can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "MANAGER")]
    Manager,
    #[serde(rename = "MODERATOR", alias = "MOD")]
    Moderator,
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "ANONYMOUS")]
    Anonymous,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Moderator,
        Role::User,
        Role::Anonymous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Moderator => "MODERATOR",
            Role::User => "USER",
            Role::Anonymous => "ANONYMOUS",
        }
    }

    /// Exact-case parse of a wire role name. `MOD` is kept as a legacy alias.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ADMIN" => Some(Role::Admin),
            "MANAGER" => Some(Role::Manager),
            "MODERATOR" | "MOD" => Some(Role::Moderator),
            "USER" => Some(Role::User),
            "ANONYMOUS" => Some(Role::Anonymous),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles held by an identity.
///
/// Tokens carry roles as plain strings; conversion into this set happens once,
/// at token decode, through [`RoleSet::from_names`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Build a role set from untrusted names, dropping anything unrecognised.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            match Role::from_name(name) {
                Some(role) => {
                    set.insert(role);
                }
                None => warn!(role = %name, "Dropping unrecognized role name"),
            }
        }
        Self(set)
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn remove(&mut self, role: Role) -> bool {
        self.0.remove(&role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// True when at least one of `required` is held.
    pub fn contains_any(&self, required: &RoleSet) -> bool {
        required.0.iter().any(|r| self.0.contains(r))
    }

    /// True when every one of `required` is held.
    pub fn contains_all(&self, required: &RoleSet) -> bool {
        required.0.is_subset(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Wire names, in a stable order.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_string()).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

/// Authenticated principal, rebuilt from a token on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject_id: i64,
    pub subject_name: String,
    pub roles: RoleSet,
}

/// JWT claims payload.
///
/// Field names are part of the wire format: `sub` is the username, `id` the
/// numeric user id, `Roles` the role names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub id: i64,
    #[serde(rename = "Roles")]
    pub roles: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn into_identity(self) -> Identity {
        Identity {
            subject_id: self.id,
            subject_name: self.sub,
            roles: RoleSet::from_names(&self.roles),
        }
    }
}

/// Stored login credential. The hash never leaves the server.
#[derive(Clone)]
pub struct Credential {
    pub identifier: String,
    pub secret_hash: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret_hash", &"<redacted>")
            .finish()
    }
}

/// A credential together with the account data needed to mint an identity
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub credential: Credential,
    pub roles: RoleSet,
}

impl Account {
    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.id,
            subject_name: self.credential.identifier.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Manager).unwrap();
        assert_eq!(json, r#""MANAGER""#);

        let moderator: Role = serde_json::from_str(r#""MOD""#).unwrap();
        assert_eq!(moderator, Role::Moderator);
    }

    #[test]
    fn test_role_name_parsing_is_exact_case() {
        assert_eq!(Role::from_name("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_name("admin"), None);
        assert_eq!(Role::from_name("SUPERUSER"), None);
    }

    #[test]
    fn test_role_set_drops_unknown_names() {
        let set = RoleSet::from_names(["USER", "ROOT", "MANAGER", "user"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Role::User));
        assert!(set.contains(Role::Manager));
        assert_eq!(set.names(), vec!["MANAGER".to_string(), "USER".to_string()]);
    }

    #[test]
    fn test_role_set_predicates() {
        let held = RoleSet::from([Role::Manager]);
        assert!(held.contains_any(&RoleSet::from([Role::Admin, Role::Manager])));
        assert!(!held.contains_any(&RoleSet::from([Role::Admin])));
        assert!(held.contains_all(&RoleSet::from([Role::Manager])));
        assert!(!held.contains_all(&RoleSet::from([Role::Manager, Role::Admin])));
        assert!(!RoleSet::new().contains_any(&RoleSet::new()));
    }

    #[test]
    fn test_claims_wire_shape() {
        let claims = Claims {
            sub: "alice".to_string(),
            id: 7,
            roles: vec!["USER".to_string()],
            iss: "postboard".to_string(),
            iat: 100,
            exp: 200,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], "alice");
        assert_eq!(value["id"], 7);
        assert_eq!(value["Roles"][0], "USER");
        assert_eq!(value["iss"], "postboard");
        assert_eq!(value["iat"], 100);
        assert_eq!(value["exp"], 200);
    }

    #[test]
    fn test_credential_debug_hides_hash() {
        let credential = Credential {
            identifier: "alice".to_string(),
            secret_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
        };
        let rendered = format!("{:?}", credential);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("$2b$"));
    }

    #[test]
    fn test_login_request_accepts_capitalized_fields() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"Username":"alice","Password":"pw"}"#).unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.password, "pw");
    }
}
