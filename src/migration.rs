//! Schema bootstrap: create the database if missing, then enum types,
//! tables, and indexes. Deletes cascade through hard foreign keys, so a
//! removed user takes its profile, posts, and comments with it.

use crate::error::AppError;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

// CREATE TYPE has no IF NOT EXISTS; an existing type is fine.
const CREATE_TYPES: &[&str] = &[
    "CREATE TYPE user_role AS ENUM ('admin', 'user', 'guest')",
    "CREATE TYPE post_status AS ENUM ('draft', 'published', 'archived')",
];

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        user_id BIGINT PRIMARY KEY REFERENCES users (id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        role user_role NOT NULL DEFAULT 'user',
        metadata JSONB,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        content TEXT,
        status post_status NOT NULL DEFAULT 'draft',
        author_id BIGINT NOT NULL REFERENCES profiles (user_id) ON DELETE CASCADE,
        tags TEXT[],
        metadata JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id BIGSERIAL PRIMARY KEY,
        content TEXT NOT NULL,
        post_id BIGINT NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
        author_id BIGINT NOT NULL REFERENCES profiles (user_id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS profiles_role_idx ON profiles (role)",
    "CREATE INDEX IF NOT EXISTS posts_status_idx ON posts (status)",
    "CREATE INDEX IF NOT EXISTS posts_author_idx ON posts (author_id)",
    "CREATE INDEX IF NOT EXISTS comments_post_idx ON comments (post_id)",
    "CREATE INDEX IF NOT EXISTS comments_author_idx ON comments (author_id)",
];

/// Apply the schema. Idempotent; safe to run on every startup.
pub async fn apply_schema(pool: &PgPool) -> Result<(), AppError> {
    for ddl in CREATE_TYPES {
        let _ = sqlx::query(ddl).execute(pool).await;
    }
    for ddl in CREATE_TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    for ddl in CREATE_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects
/// to the default `postgres` database to run CREATE DATABASE. Call before
/// creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {e}")))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await?;
    if !exists.0 {
        let quoted = quote_ident(&db_name);
        sqlx::query(&format!("CREATE DATABASE {quoted}"))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{base}postgres");
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::parse_db_name_from_url;

    #[test]
    fn splits_database_name_from_url() {
        let (admin, name) =
            parse_db_name_from_url("postgres://localhost:5432/postboard").unwrap();
        assert_eq!(admin, "postgres://localhost:5432/postgres");
        assert_eq!(name, "postboard");
    }

    #[test]
    fn drops_query_string() {
        let (_, name) =
            parse_db_name_from_url("postgres://host/postboard?sslmode=require").unwrap();
        assert_eq!(name, "postboard");
    }

    #[test]
    fn no_slash_is_an_error() {
        assert!(parse_db_name_from_url("not-a-url").is_err());
    }
}
