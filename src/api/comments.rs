//! Comment endpoints

use crate::api::{ensure_owner, posts::ContentRequest, subject, ApiError, AppState};
use crate::auth::RequestContext;
use crate::store::Comment;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// POST /post/:id/comment
pub async fn create_comment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<i64>,
    Json(payload): Json<ContentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let owner = subject(&ctx)?;
    let comment = state
        .comments
        .create_comment(post_id, owner, &payload.content)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /post/:id/comment
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if state.posts.find_post(post_id)?.is_none() {
        return Err(ApiError::NotFound(format!("post {} not found", post_id)));
    }
    Ok(Json(state.comments.list_comments_by_post(post_id)?))
}

/// GET /comment/list - the caller's own comments
pub async fn list_my_comments(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.comments.list_comments_by_owner(subject(&ctx)?)?))
}

/// GET /comment/list/:username
pub async fn list_comments_by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.comments.list_comments_by_owner(&username)?))
}

/// DELETE /comment/:id - owner only
pub async fn delete_comment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let comment = state
        .comments
        .find_comment(id)?
        .ok_or_else(|| ApiError::NotFound(format!("comment {} not found", id)))?;
    ensure_owner(&ctx, &comment.owner)?;

    state.comments.delete_comment(id)?;
    Ok(StatusCode::ACCEPTED)
}

/// DELETE /comment/force/:id - role-gated
pub async fn force_delete_comment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comments.delete_comment(id)?;
    info!(
        moderator = ctx.subject_name().unwrap_or("-"),
        "🗑️  Comment {} force-deleted", id
    );
    Ok(StatusCode::ACCEPTED)
}
