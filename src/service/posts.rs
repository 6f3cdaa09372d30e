//! Post helpers.

use crate::error::AppError;
use crate::model::{NewPost, Post, UpdatePost};
use crate::sql::{self, PostFilter};
use sqlx::PgPool;

use super::BULK_LIMIT;

pub async fn create_post(pool: &PgPool, input: &NewPost) -> Result<Post, AppError> {
    let post = sqlx::query_as(sql::INSERT_POST)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.status)
        .bind(input.author_id)
        .bind(&input.tags)
        .bind(&input.metadata)
        .fetch_one(pool)
        .await?;
    Ok(post)
}

pub async fn list_posts(pool: &PgPool, filter: &PostFilter) -> Result<Vec<Post>, AppError> {
    let mut qb = sql::select_posts(filter);
    tracing::debug!(sql = qb.sql(), "query");
    let rows = qb.build_query_as::<Post>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn get_post(pool: &PgPool, id: i64) -> Result<Option<Post>, AppError> {
    let row = sqlx::query_as(sql::SELECT_POST_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn update_post(
    pool: &PgPool,
    id: i64,
    changes: &UpdatePost,
) -> Result<Option<Post>, AppError> {
    let mut qb = sql::update_post(id, changes);
    tracing::debug!(sql = qb.sql(), "query");
    let row = qb.build_query_as::<Post>().fetch_optional(pool).await?;
    Ok(row)
}

pub async fn delete_post(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let deleted = sqlx::query(sql::DELETE_POST)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(deleted.is_some())
}

pub async fn bulk_create_posts(pool: &PgPool, items: &[NewPost]) -> Result<Vec<Post>, AppError> {
    if items.len() > BULK_LIMIT {
        return Err(AppError::BadRequest(format!(
            "bulk create limited to {BULK_LIMIT} items"
        )));
    }
    let mut tx = pool.begin().await?;
    let mut out = Vec::with_capacity(items.len());
    for input in items {
        let post: Post = sqlx::query_as(sql::INSERT_POST)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.status)
            .bind(input.author_id)
            .bind(&input.tags)
            .bind(&input.metadata)
            .fetch_one(&mut *tx)
            .await?;
        out.push(post);
    }
    tx.commit().await?;
    Ok(out)
}
