//! User helpers. The account and profile rows are written together; the
//! merged record is what callers see.

use crate::error::AppError;
use crate::model::{Account, NewUser, ProfileRow, UpdateUser, User, UserPostCount};
use crate::sql::{self, UserFilter};
use sqlx::{PgConnection, PgPool};

use super::BULK_LIMIT;

pub async fn create_user(pool: &PgPool, input: &NewUser) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;
    let user = create_in_tx(&mut tx, input).await?;
    tx.commit().await?;
    Ok(user)
}

/// Insert account, profile, and any initial posts on the given connection.
/// Used by single and bulk creation so both share the same write path.
pub(crate) async fn create_in_tx(
    tx: &mut PgConnection,
    input: &NewUser,
) -> Result<User, AppError> {
    let account: Account = sqlx::query_as(sql::INSERT_USER)
        .bind(&input.email)
        .fetch_one(&mut *tx)
        .await?;
    let profile: ProfileRow = sqlx::query_as(sql::INSERT_PROFILE)
        .bind(account.id)
        .bind(&input.name)
        .bind(input.role)
        .bind(&input.metadata)
        .bind(input.is_active)
        .fetch_one(&mut *tx)
        .await?;
    for post in &input.posts {
        sqlx::query(sql::INSERT_POST)
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.status)
            .bind(account.id)
            .bind(&post.tags)
            .bind(&post.metadata)
            .execute(&mut *tx)
            .await?;
    }
    Ok(User::from_parts(account, profile))
}

pub async fn list_users(pool: &PgPool, filter: &UserFilter) -> Result<Vec<User>, AppError> {
    let mut qb = sql::select_users(filter);
    tracing::debug!(sql = qb.sql(), "query");
    let rows = qb.build_query_as::<User>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as(sql::SELECT_USER_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn update_user(
    pool: &PgPool,
    id: i64,
    changes: &UpdateUser,
) -> Result<Option<User>, AppError> {
    let mut tx = pool.begin().await?;
    if let Some(email) = &changes.email {
        let res = sqlx::query(sql::UPDATE_ACCOUNT_EMAIL)
            .bind(email)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
    }
    let mut qb = sql::update_profile(id, changes);
    tracing::debug!(sql = qb.sql(), "query");
    let touched: Option<(i64,)> = qb.build_query_as().fetch_optional(&mut *tx).await?;
    if touched.is_none() {
        return Ok(None);
    }
    let user: Option<User> = sqlx::query_as(sql::SELECT_USER_BY_ID)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn delete_user(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let deleted = sqlx::query(sql::DELETE_USER)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(deleted.is_some())
}

pub async fn bulk_create_users(pool: &PgPool, items: &[NewUser]) -> Result<Vec<User>, AppError> {
    if items.len() > BULK_LIMIT {
        return Err(AppError::BadRequest(format!(
            "bulk create limited to {BULK_LIMIT} items"
        )));
    }
    let mut tx = pool.begin().await?;
    let mut out = Vec::with_capacity(items.len());
    for input in items {
        out.push(create_in_tx(&mut tx, input).await?);
    }
    tx.commit().await?;
    Ok(out)
}

pub async fn users_with_post_count(pool: &PgPool) -> Result<Vec<UserPostCount>, AppError> {
    let rows = sqlx::query_as(sql::USERS_WITH_POST_COUNT)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
