//! Role-based authorization gate
//! Mission: Deny any request whose role set does not satisfy the route's requirement

use crate::auth::{
    error::AuthError,
    middleware::{extract_context, RequestContext},
    models::{Role, RoleSet},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleMatch {
    /// At least one required role must be held
    Any,
    /// Every required role must be held
    All,
}

/// Role predicate attached to a route.
///
/// Evaluated against the [`RequestContext`] left by the authentication gate.
/// A missing or anonymous context never satisfies a requirement.
#[derive(Debug, Clone)]
pub struct RoleRequirement {
    required: RoleSet,
    mode: RoleMatch,
}

impl RoleRequirement {
    pub fn any<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self {
            required: roles.into_iter().collect(),
            mode: RoleMatch::Any,
        }
    }

    pub fn all<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self {
            required: roles.into_iter().collect(),
            mode: RoleMatch::All,
        }
    }

    pub fn mode(&self) -> RoleMatch {
        self.mode
    }

    pub fn check(&self, ctx: Option<&RequestContext>) -> Result<(), AuthError> {
        let Some(ctx) = ctx.filter(|c| c.is_authenticated()) else {
            return Err(AuthError::Forbidden);
        };

        let held = ctx.roles();
        let satisfied = match self.mode {
            RoleMatch::Any => held.contains_any(&self.required),
            RoleMatch::All => held.contains_all(&self.required),
        };

        if satisfied {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

pub fn require_any_role(ctx: Option<&RequestContext>, required: &[Role]) -> Result<(), AuthError> {
    RoleRequirement::any(required.iter().copied()).check(ctx)
}

pub fn require_all_roles(ctx: Option<&RequestContext>, required: &[Role]) -> Result<(), AuthError> {
    RoleRequirement::all(required.iter().copied()).check(ctx)
}

/// Authorization middleware. Layer it inside (after) the authentication gate:
///
/// ```ignore
/// .route_layer(middleware::from_fn_with_state(RoleRequirement::any([Role::Admin]), authorize))
/// .route_layer(middleware::from_fn_with_state(tokens, auth_middleware))
/// ```
pub async fn authorize(
    State(requirement): State<RoleRequirement>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(e) = requirement.check(extract_context(&req)) {
        debug!(
            path = %req.uri().path(),
            subject = extract_context(&req).and_then(|c| c.subject_name()).unwrap_or("-"),
            "Authorization denied: {:?} of {:?}",
            requirement.mode,
            requirement.required.names()
        );
        return Err(e);
    }

    Ok(next.run(req).await)
}
