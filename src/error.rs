//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("storage: {0}")]
    Storage(#[from] sled::Error),
    #[error("encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Outcome of inspecting a backend error's SQLSTATE and message.
#[derive(Debug, PartialEq, Eq)]
enum DbErrorKind {
    UniqueViolation,
    ForeignKeyViolation,
    Transient,
    Other,
}

fn classify(code: &str, message: &str) -> DbErrorKind {
    match code {
        "23505" => DbErrorKind::UniqueViolation,
        "23503" => DbErrorKind::ForeignKeyViolation,
        // insufficient resources / connection exceptions
        "53300" | "57P03" | "08000" | "08001" | "08006" => DbErrorKind::Transient,
        _ if message.contains("too many connections")
            || message.contains("connection pool") =>
        {
            DbErrorKind::Transient
        }
        _ => DbErrorKind::Other,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            sqlx::Error::PoolTimedOut => {
                AppError::Unavailable("connection pool timed out, try again".into())
            }
            sqlx::Error::Database(db) => {
                let code = db.code().map(|c| c.to_string()).unwrap_or_default();
                match classify(&code, db.message()) {
                    DbErrorKind::UniqueViolation => {
                        let what = db.constraint().unwrap_or("unique constraint");
                        AppError::Conflict(format!("duplicate value violates {what}"))
                    }
                    DbErrorKind::ForeignKeyViolation => {
                        let what = db.constraint().unwrap_or("foreign key");
                        AppError::BadRequest(format!("referenced row does not exist ({what})"))
                    }
                    DbErrorKind::Transient => {
                        AppError::Unavailable("database is busy, try again".into())
                    }
                    DbErrorKind::Other => AppError::Db(sqlx::Error::Database(db)),
                }
            }
            other => AppError::Db(other),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            AppError::Encoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "encoding_error"),
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, DbErrorKind};

    #[test]
    fn unique_violation_by_sqlstate() {
        assert_eq!(
            classify(
                "23505",
                "duplicate key value violates unique constraint \"users_email_key\""
            ),
            DbErrorKind::UniqueViolation
        );
    }

    #[test]
    fn foreign_key_violation_by_sqlstate() {
        assert_eq!(
            classify(
                "23503",
                "insert or update on table \"posts\" violates foreign key constraint"
            ),
            DbErrorKind::ForeignKeyViolation
        );
    }

    #[test]
    fn transient_by_sqlstate() {
        assert_eq!(
            classify("53300", "sorry, too many clients already"),
            DbErrorKind::Transient
        );
        assert_eq!(classify("08006", "connection failure"), DbErrorKind::Transient);
    }

    #[test]
    fn transient_by_message() {
        assert_eq!(
            classify("", "FATAL: too many connections for role"),
            DbErrorKind::Transient
        );
        assert_eq!(classify("", "connection pool timed out"), DbErrorKind::Transient);
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(classify("42601", "syntax error"), DbErrorKind::Other);
        assert_eq!(classify("", "some driver hiccup"), DbErrorKind::Other);
    }
}
