//! Post endpoints: ownership and moderation gates over the post store

use crate::api::{ensure_owner, subject, ApiError, AppState};
use crate::auth::RequestContext;
use crate::store::Post;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

fn load_post(state: &AppState, id: i64) -> Result<Post, ApiError> {
    state
        .posts
        .find_post(id)?
        .ok_or_else(|| ApiError::NotFound(format!("post {} not found", id)))
}

/// POST /post - owner is always the caller
pub async fn create_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<ContentRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let owner = subject(&ctx)?;
    let post = state.posts.create_post(owner, &payload.content)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /post/:id
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(load_post(&state, id)?))
}

/// GET /post/list - the caller's own posts
pub async fn list_my_posts(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list_posts_by_owner(subject(&ctx)?)?))
}

/// GET /post/list/:username
pub async fn list_posts_by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list_posts_by_owner(&username)?))
}

/// DELETE /post/:id - owner only
pub async fn delete_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let post = load_post(&state, id)?;
    ensure_owner(&ctx, &post.owner)?;

    state.posts.delete_post(id)?;
    Ok(StatusCode::ACCEPTED)
}

/// DELETE /post/force/:id - role-gated, skips the ownership rule
pub async fn force_delete_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.posts.delete_post(id)?;
    info!(
        moderator = ctx.subject_name().unwrap_or("-"),
        "🗑️  Post {} force-deleted", id
    );
    Ok(StatusCode::ACCEPTED)
}
