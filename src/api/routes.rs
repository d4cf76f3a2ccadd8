//! Route table
//!
//! Every route picks its gates explicitly. Role layers are added before the
//! authentication layer so authentication runs first (outermost).

use crate::api::{comments, posts, users, AppState};
use crate::auth::{auth_middleware, authorize, optional_auth_middleware, Role, RoleRequirement};
use crate::middleware::request_logging;
use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

pub fn router(state: AppState) -> Router {
    let tokens = state.tokens.clone();

    let authn = middleware::from_fn_with_state(tokens.clone(), auth_middleware);
    let optional = middleware::from_fn_with_state(tokens, optional_auth_middleware);

    let requires = |requirement: RoleRequirement| middleware::from_fn_with_state(requirement, authorize);
    let admin_only = requires(RoleRequirement::any([Role::Admin]));
    let can_post = requires(RoleRequirement::any([
        Role::User,
        Role::Moderator,
        Role::Manager,
        Role::Admin,
    ]));
    let post_moderators = requires(RoleRequirement::any([Role::Admin, Role::Manager]));
    let comment_moderators = requires(RoleRequirement::any([
        Role::Admin,
        Role::Manager,
        Role::Moderator,
    ]));

    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(users::login))
        .route(
            "/user",
            post(users::create_user)
                .route_layer(optional)
                .merge(
                    get(users::get_user)
                        .put(users::update_user)
                        .route_layer(authn.clone()),
                ),
        )
        .route(
            "/user/:username",
            get(users::get_user_by_username).route_layer(authn.clone()),
        )
        .route("/auth/me", get(users::me).route_layer(authn.clone()))
        .route(
            "/user/:username/role",
            post(users::add_role)
                .delete(users::remove_role)
                .route_layer(admin_only)
                .route_layer(authn.clone()),
        )
        .route(
            "/post",
            post(posts::create_post)
                .route_layer(can_post)
                .route_layer(authn.clone()),
        )
        .route(
            "/post/list",
            get(posts::list_my_posts).route_layer(authn.clone()),
        )
        .route(
            "/post/list/:username",
            get(posts::list_posts_by_user).route_layer(authn.clone()),
        )
        .route(
            "/post/force/:id",
            delete(posts::force_delete_post)
                .route_layer(post_moderators)
                .route_layer(authn.clone()),
        )
        .route(
            "/post/:id",
            get(posts::get_post)
                .delete(posts::delete_post)
                .route_layer(authn.clone()),
        )
        .route(
            "/post/:id/comment",
            post(comments::create_comment)
                .get(comments::list_comments)
                .route_layer(authn.clone()),
        )
        .route(
            "/comment/list",
            get(comments::list_my_comments).route_layer(authn.clone()),
        )
        .route(
            "/comment/list/:username",
            get(comments::list_comments_by_user).route_layer(authn.clone()),
        )
        .route(
            "/comment/force/:id",
            delete(comments::force_delete_comment)
                .route_layer(comment_moderators)
                .route_layer(authn.clone()),
        )
        .route(
            "/comment/:id",
            delete(comments::delete_comment).route_layer(authn),
        )
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}
