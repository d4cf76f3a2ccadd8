//! HTTP API
//! Mission: Thin handlers behind the authentication and authorization gates

pub mod comments;
pub mod error;
pub mod posts;
pub mod routes;
pub mod users;

pub use error::ApiError;
pub use routes::router;

use crate::auth::{LoginService, PasswordHasher, RequestContext, TokenService};
use crate::store::{CommentRepository, CredentialStore, PostRepository, UserRepository};
use std::sync::Arc;

/// Shared state handed to every handler. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<dyn TokenService>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub login: LoginService,
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl AppState {
    /// Wire every collaborator to a single backing store
    pub fn new<S>(tokens: Arc<dyn TokenService>, hasher: Arc<dyn PasswordHasher>, store: Arc<S>) -> Self
    where
        S: CredentialStore + UserRepository + PostRepository + CommentRepository + 'static,
    {
        Self {
            login: LoginService::new(store.clone(), hasher.clone()),
            tokens,
            hasher,
            users: store.clone(),
            posts: store.clone(),
            comments: store,
        }
    }
}

/// Name of the authenticated caller. Gated routes always have one; if not,
/// the route was wired wrong and the request is denied.
pub(crate) fn subject(ctx: &RequestContext) -> Result<&str, ApiError> {
    ctx.subject_name()
        .ok_or(ApiError::Auth(crate::auth::AuthError::Forbidden))
}

/// Resource-level ownership rule, applied after the gates have passed
pub(crate) fn ensure_owner(ctx: &RequestContext, owner: &str) -> Result<(), ApiError> {
    if subject(ctx)? == owner {
        Ok(())
    } else {
        Err(ApiError::Forbidden("resource belongs to another user"))
    }
}

/// Run CPU-heavy work (bcrypt) off the async workers
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(ApiError::internal)
}
