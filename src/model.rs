//! Domain model: entity records, enumerations, and write payloads.
//!
//! The API exposes users as the merged account + profile record; the two
//! rows are written together and share an identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
    Guest,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn parse(s: &str) -> Option<PostStatus> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

/// Account row from `users`.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
}

/// Profile row from `profiles`, keyed by its user's id.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
    pub metadata: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Merged account + profile record as returned by the API.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub metadata: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_parts(account: Account, profile: ProfileRow) -> User {
        User {
            id: account.id,
            email: account.email,
            name: profile.name,
            role: profile.role,
            metadata: profile.metadata,
            is_active: profile.is_active,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub status: PostStatus,
    pub author_id: i64,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate row: one user with the number of posts they authored.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPostCount {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub post_count: i64,
}

/// Validated payload for user creation. Defaults are already applied;
/// `posts` holds optional initial posts written in the same transaction.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub metadata: Option<Value>,
    pub is_active: bool,
    pub posts: Vec<NewUserPost>,
}

#[derive(Debug, Clone)]
pub struct NewUserPost {
    pub title: String,
    pub content: Option<String>,
    pub status: PostStatus,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Value>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub metadata: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: Option<String>,
    pub status: PostStatus,
    pub author_id: i64,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("guest"), Some(Role::Guest));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse("Admin"), None);
    }

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!(PostStatus::parse("draft"), Some(PostStatus::Draft));
        assert_eq!(PostStatus::parse("published"), Some(PostStatus::Published));
        assert_eq!(PostStatus::parse("archived"), Some(PostStatus::Archived));
        assert_eq!(PostStatus::parse("deleted"), None);
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Role::Guest).unwrap(), "guest");
        assert_eq!(serde_json::to_value(PostStatus::Published).unwrap(), "published");
    }

    #[test]
    fn defaults_are_user_and_draft() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!(PostStatus::default(), PostStatus::Draft);
    }

    #[test]
    fn user_serializes_camel_case() {
        let now = Utc::now();
        let user = User {
            id: 1,
            email: "ada@example.com".into(),
            name: "Ada".into(),
            role: Role::User,
            metadata: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let v = serde_json::to_value(&user).unwrap();
        assert!(v.get("isActive").is_some());
        assert!(v.get("createdAt").is_some());
        assert!(v.get("is_active").is_none());
    }
}
