//! HTTP subset served by the sync backend: user CRUD with UUID ids.

use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::validation;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::store::SyncStore;

#[derive(Clone)]
pub struct SyncState {
    pub store: Arc<SyncStore>,
}

fn parse_uuid(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw)
        .map(|u| u.to_string())
        .map_err(|_| AppError::BadRequest(format!("invalid id '{raw}'")))
}

async fn list(State(state): State<SyncState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.store.list_users()?))
}

async fn create(
    State(state): State<SyncState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let input = validation::new_user(&body)?;
    let user = state.store.create_user(&input)?;
    Ok(success_one(user))
}

async fn read(
    State(state): State<SyncState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_uuid(&id)?;
    let user = state
        .store
        .get_user(&id)?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    Ok(success_one_ok(user))
}

async fn update(
    State(state): State<SyncState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_uuid(&id)?;
    let changes = validation::update_user(&body)?;
    let user = state
        .store
        .update_user(&id, &changes)?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    Ok(success_one_ok(user))
}

async fn delete(
    State(state): State<SyncState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_uuid(&id)?;
    if !state.store.delete_user(&id)? {
        return Err(AppError::NotFound(format!("user {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn sync_routes(state: SyncState) -> Router {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/:id", get(read).put(update).delete(delete))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::parse_uuid;
    use crate::error::AppError;

    #[test]
    fn uuid_ids_parse() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(parse_uuid(id).unwrap(), id);
    }

    #[test]
    fn non_uuid_ids_are_bad_requests() {
        assert!(matches!(parse_uuid("abc"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_uuid("123"), Err(AppError::BadRequest(_))));
    }
}
