//! Post handlers, including filtered listing and full-text search.

use crate::error::AppError;
use crate::model::PostStatus;
use crate::response::{success_many, success_many_created, success_one, success_one_ok};
use crate::service::{posts, validation};
use crate::sql::PostFilter;
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
pub struct ListPostsParams {
    pub status: Option<PostStatus>,
    pub author: Option<i64>,
    pub tag: Option<String>,
    /// Full-text search over title and content.
    pub q: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = PostFilter {
        status: params.status,
        author: params.author,
        tag: params.tag,
        search: params.q,
        limit: params.limit,
        offset: params.offset,
    };
    let rows = posts::list_posts(&state.pool, &filter).await?;
    Ok(success_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let input = validation::new_post(&body)?;
    let post = posts::create_post(&state.pool, &input).await?;
    Ok(success_one(post))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let post = posts::get_post(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
    Ok(success_one_ok(post))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let changes = validation::update_post(&body)?;
    let post = posts::update_post(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
    Ok(success_one_ok(post))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    if !posts::delete_post(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("post {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let items = match &body {
        Value::Array(items) => items
            .iter()
            .map(validation::new_post)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(AppError::BadRequest("body must be a JSON array".into())),
    };
    let rows = posts::bulk_create_posts(&state.pool, &items).await?;
    Ok(success_many_created(rows))
}
