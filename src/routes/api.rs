//! Entity CRUD routes for the relational backend. Static segments are
//! registered alongside `:id` captures; the router prefers the static match.

use crate::handlers::{comments, posts, users};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/bulk", post(users::bulk_create))
        .route("/users/post-counts", get(users::post_counts))
        .route(
            "/users/:id",
            get(users::read).put(users::update).delete(users::delete),
        )
        .route("/posts", get(posts::list).post(posts::create))
        .route("/posts/bulk", post(posts::bulk_create))
        .route(
            "/posts/:id",
            get(posts::read).put(posts::update).delete(posts::delete),
        )
        .route("/posts/:id/comments", get(comments::list_for_post))
        .route("/comments", get(comments::list).post(comments::create))
        .route(
            "/comments/:id",
            get(comments::read).delete(comments::delete),
        )
        .with_state(state)
}
