//! Comment handlers.

use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{comments, posts, validation};
use crate::sql::CommentFilter;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::parse_id;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsParams {
    pub post: Option<i64>,
    pub author: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListCommentsParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = CommentFilter {
        post: params.post,
        author: params.author,
        limit: params.limit,
        offset: params.offset,
    };
    let rows = comments::list_comments(&state.pool, &filter).await?;
    Ok(success_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let input = validation::new_comment(&body)?;
    let comment = comments::create_comment(&state.pool, &input).await?;
    Ok(success_one(comment))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let comment = comments::get_comment(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {id}")))?;
    Ok(success_one_ok(comment))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    if !comments::delete_comment(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("comment {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /posts/{id}/comments — 404s when the post itself is missing, so an
/// empty list always means "post exists, no comments yet".
pub async fn list_for_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    if posts::get_post(&state.pool, id).await?.is_none() {
        return Err(AppError::NotFound(format!("post {id}")));
    }
    let filter = CommentFilter {
        post: Some(id),
        ..Default::default()
    };
    let rows = comments::list_comments(&state.pool, &filter).await?;
    Ok(success_many(rows))
}
