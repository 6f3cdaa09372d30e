//! Comment helpers. Comments are immutable once written; only creation,
//! lookup, listing, and deletion exist.

use crate::error::AppError;
use crate::model::{Comment, NewComment};
use crate::sql::{self, CommentFilter};
use sqlx::PgPool;

pub async fn create_comment(pool: &PgPool, input: &NewComment) -> Result<Comment, AppError> {
    let comment = sqlx::query_as(sql::INSERT_COMMENT)
        .bind(&input.content)
        .bind(input.post_id)
        .bind(input.author_id)
        .fetch_one(pool)
        .await?;
    Ok(comment)
}

pub async fn list_comments(
    pool: &PgPool,
    filter: &CommentFilter,
) -> Result<Vec<Comment>, AppError> {
    let mut qb = sql::select_comments(filter);
    tracing::debug!(sql = qb.sql(), "query");
    let rows = qb.build_query_as::<Comment>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn get_comment(pool: &PgPool, id: i64) -> Result<Option<Comment>, AppError> {
    let row = sqlx::query_as(sql::SELECT_COMMENT_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn delete_comment(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let deleted = sqlx::query(sql::DELETE_COMMENT)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(deleted.is_some())
}
