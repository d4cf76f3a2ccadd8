//! Persistence collaborators
//! Mission: Narrow repository contracts the auth core and handlers depend on

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::auth::models::{Account, Role, RoleSet};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User account as persisted
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub roles: RoleSet,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub owner: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub owner: String,
    pub post_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Lookup used by login
pub trait CredentialStore: Send + Sync {
    fn find_credential_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<Account>>;
}

pub trait UserRepository: Send + Sync {
    fn create_user(&self, username: &str, password_hash: &str, roles: &RoleSet)
        -> StoreResult<User>;
    fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Replaces the stored hash wholesale
    fn update_password(&self, username: &str, password_hash: &str) -> StoreResult<()>;
    fn add_role(&self, username: &str, role: Role) -> StoreResult<()>;
    fn remove_role(&self, username: &str, role: Role) -> StoreResult<()>;
}

pub trait PostRepository: Send + Sync {
    fn create_post(&self, owner: &str, content: &str) -> StoreResult<Post>;
    fn find_post(&self, id: i64) -> StoreResult<Option<Post>>;
    fn list_posts_by_owner(&self, owner: &str) -> StoreResult<Vec<Post>>;
    /// Also removes the post's comments
    fn delete_post(&self, id: i64) -> StoreResult<()>;
}

pub trait CommentRepository: Send + Sync {
    fn create_comment(&self, post_id: i64, owner: &str, content: &str) -> StoreResult<Comment>;
    fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>>;
    fn list_comments_by_post(&self, post_id: i64) -> StoreResult<Vec<Comment>>;
    fn list_comments_by_owner(&self, owner: &str) -> StoreResult<Vec<Comment>>;
    fn delete_comment(&self, id: i64) -> StoreResult<()>;
}
