//! User handlers: merged account + profile CRUD, bulk creation, and the
//! post-count aggregate.

use crate::error::AppError;
use crate::model::Role;
use crate::response::{success_many, success_many_created, success_one, success_one_ok};
use crate::service::{users, validation};
use crate::sql::UserFilter;
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
pub struct ListUsersParams {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = UserFilter {
        role: params.role,
        is_active: params.is_active,
        limit: params.limit,
        offset: params.offset,
    };
    let rows = users::list_users(&state.pool, &filter).await?;
    Ok(success_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let input = validation::new_user(&body)?;
    let user = users::create_user(&state.pool, &input).await?;
    Ok(success_one(user))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let user = users::get_user(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    Ok(success_one_ok(user))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let changes = validation::update_user(&body)?;
    let user = users::update_user(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    Ok(success_one_ok(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    if !users::delete_user(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("user {id}")));
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
            .map(validation::new_user)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(AppError::BadRequest("body must be a JSON array".into())),
    };
    let rows = users::bulk_create_users(&state.pool, &items).await?;
    Ok(success_many_created(rows))
}

pub async fn post_counts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = users::users_with_post_count(&state.pool).await?;
    Ok(success_many(rows))
}
