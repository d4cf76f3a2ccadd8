//! Login and user account endpoints

use crate::api::{blocking, subject, ApiError, AppState};
use crate::auth::{
    middleware::BEARER_PREFIX,
    models::{LoginRequest, Role, RoleSet},
    RequestContext,
};
use crate::store::User;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
}

/// Identity as seen by the caller, straight from the request context
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

async fn hash_password(state: &AppState, password: String) -> Result<String, ApiError> {
    let hasher = state.hasher.clone();
    Ok(blocking(move || hasher.hash(&password)).await??)
}

/// Login endpoint - POST /login
///
/// Replies 202 with a plain-text `Bearer <token>` body. Unknown user and
/// wrong password both produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    let service = state.login.clone();
    let username = payload.username.clone();
    let identity = blocking(move || service.login(&payload.username, &payload.password))
        .await?
        .map_err(ApiError::internal)?;

    let Some(identity) = identity else {
        warn!("❌ Failed login attempt: {}", username);
        return Err(ApiError::InvalidCredentials);
    };

    let token = state
        .tokens
        .issue_token(&identity)
        .map_err(ApiError::internal)?;

    info!(
        "✅ Login successful: {} ({:?})",
        identity.subject_name,
        identity.roles.names()
    );

    Ok((
        StatusCode::ACCEPTED,
        [(header::CONTENT_TYPE, "text/plain")],
        format!("{}{}", BEARER_PREFIX, token),
    )
        .into_response())
}

/// Register - POST /user (optional auth)
///
/// Anonymous callers always get `USER`. Only an authenticated ADMIN may
/// choose roles; anyone else asking for more than `USER` is refused.
/// Unknown role names are a 400 for every caller.
pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }
    validate_password(&payload.password)?;

    let default_roles = RoleSet::from([Role::User]);
    let roles = match payload.roles {
        None => default_roles,
        Some(names) => {
            let requested = names
                .iter()
                .map(|name| parse_role(name))
                .collect::<Result<RoleSet, _>>()?;
            if requested.is_empty() || requested == default_roles {
                default_roles
            } else if ctx.roles().contains(Role::Admin) {
                requested
            } else {
                warn!(
                    caller = ctx.subject_name().unwrap_or("anonymous"),
                    "Refusing role assignment during registration: {:?}",
                    requested.names()
                );
                return Err(ApiError::Forbidden("only administrators may assign roles"));
            }
        }
    };

    let hash = hash_password(&state, payload.password).await?;
    let user = state.users.create_user(&username, &hash, &roles)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Current user record - GET /user
pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<User>, ApiError> {
    let username = subject(&ctx)?;
    let user = state
        .users
        .find_by_username(username)?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", username)))?;

    Ok(Json(user))
}

/// Look up another account - GET /user/:username
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .users
        .find_by_username(&username)?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", username)))?;

    Ok(Json(user))
}

/// Change own password - PUT /user
pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let username = subject(&ctx)?.to_string();
    validate_password(&payload.password)?;

    let hash = hash_password(&state, payload.password).await?;
    state.users.update_password(&username, &hash)?;

    Ok(StatusCode::ACCEPTED)
}

/// Who am I - GET /auth/me
///
/// Built from the request context alone; no store lookup.
pub async fn me(ctx: RequestContext) -> Result<Json<MeResponse>, ApiError> {
    let identity = ctx
        .identity()
        .ok_or(ApiError::Auth(crate::auth::AuthError::Forbidden))?;

    Ok(Json(MeResponse {
        id: identity.subject_id,
        username: identity.subject_name.clone(),
        roles: identity.roles.names(),
    }))
}

fn parse_role(name: &str) -> Result<Role, ApiError> {
    Role::from_name(name).ok_or_else(|| ApiError::BadRequest(format!("unknown role {}", name)))
}

/// Grant a role - POST /user/:username/role (ADMIN)
///
/// Existing tokens keep their old roles until they expire.
pub async fn add_role(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> Result<StatusCode, ApiError> {
    let role = parse_role(&payload.name)?;
    state.users.add_role(&username, role)?;
    Ok(StatusCode::ACCEPTED)
}

/// Revoke a role - DELETE /user/:username/role (ADMIN)
pub async fn remove_role(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> Result<StatusCode, ApiError> {
    let role = parse_role(&payload.name)?;
    state.users.remove_role(&username, role)?;
    Ok(StatusCode::ACCEPTED)
}
