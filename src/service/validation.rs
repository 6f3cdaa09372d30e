//! Request body validation: required fields, formats, enum membership.
//! Bodies arrive as raw JSON so every rejection is a 400 with a field-level
//! message rather than a serde error.

use crate::error::AppError;
use crate::model::{
    NewComment, NewPost, NewUser, NewUserPost, PostStatus, Role, UpdatePost, UpdateUser,
};
use regex::Regex;
use serde_json::{Map, Value};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const TITLE_MAX: usize = 255;

pub fn new_user(body: &Value) -> Result<NewUser, AppError> {
    let obj = object(body)?;
    let name = require_string(obj, "name")?;
    let email = require_string(obj, "email")?;
    check_email(&email)?;
    let role = match present(obj, "role") {
        Some(v) => parse_role(v)?,
        None => Role::default(),
    };
    let metadata = metadata_field(obj, "metadata");
    let is_active = optional_bool(obj, "isActive")?.unwrap_or(true);
    let posts = match present(obj, "posts") {
        Some(Value::Array(items)) => items
            .iter()
            .map(new_user_post)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(AppError::Validation("posts must be an array".into())),
        None => Vec::new(),
    };
    Ok(NewUser {
        name,
        email,
        role,
        metadata,
        is_active,
        posts,
    })
}

pub fn update_user(body: &Value) -> Result<UpdateUser, AppError> {
    let obj = object(body)?;
    let email = optional_string(obj, "email")?;
    if let Some(email) = &email {
        check_email(email)?;
    }
    let name = optional_string(obj, "name")?;
    if let Some(name) = &name {
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
    }
    let role = match present(obj, "role") {
        Some(v) => Some(parse_role(v)?),
        None => None,
    };
    Ok(UpdateUser {
        name,
        email,
        role,
        metadata: metadata_field(obj, "metadata"),
        is_active: optional_bool(obj, "isActive")?,
    })
}

fn new_user_post(body: &Value) -> Result<NewUserPost, AppError> {
    let obj = object(body)?;
    Ok(NewUserPost {
        title: title_field(obj)?,
        content: optional_string(obj, "content")?,
        status: match present(obj, "status") {
            Some(v) => parse_status(v)?,
            None => PostStatus::default(),
        },
        tags: optional_string_array(obj, "tags")?,
        metadata: metadata_field(obj, "metadata"),
    })
}

pub fn new_post(body: &Value) -> Result<NewPost, AppError> {
    let obj = object(body)?;
    let inner = new_user_post(body)?;
    let author_id = require_i64(obj, "authorId")?;
    Ok(NewPost {
        title: inner.title,
        content: inner.content,
        status: inner.status,
        author_id,
        tags: inner.tags,
        metadata: inner.metadata,
    })
}

pub fn update_post(body: &Value) -> Result<UpdatePost, AppError> {
    let obj = object(body)?;
    let title = optional_string(obj, "title")?;
    if let Some(title) = &title {
        check_title(title)?;
    }
    Ok(UpdatePost {
        title,
        content: optional_string(obj, "content")?,
        status: match present(obj, "status") {
            Some(v) => Some(parse_status(v)?),
            None => None,
        },
        tags: optional_string_array(obj, "tags")?,
        metadata: metadata_field(obj, "metadata"),
    })
}

pub fn new_comment(body: &Value) -> Result<NewComment, AppError> {
    let obj = object(body)?;
    Ok(NewComment {
        content: require_string(obj, "content")?,
        post_id: require_i64(obj, "postId")?,
        author_id: require_i64(obj, "authorId")?,
    })
}

fn object(body: &Value) -> Result<&Map<String, Value>, AppError> {
    body.as_object()
        .ok_or_else(|| AppError::BadRequest("body must be a JSON object".into()))
}

/// A key set to JSON null counts as absent.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn require_string(obj: &Map<String, Value>, key: &str) -> Result<String, AppError> {
    match present(obj, key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(AppError::Validation(format!("{key} must not be empty"))),
        Some(_) => Err(AppError::Validation(format!("{key} must be a string"))),
        None => Err(AppError::Validation(format!("{key} is required"))),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, AppError> {
    match present(obj, key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AppError::Validation(format!("{key} must be a string"))),
        None => Ok(None),
    }
}

fn optional_bool(obj: &Map<String, Value>, key: &str) -> Result<Option<bool>, AppError> {
    match present(obj, key) {
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(AppError::Validation(format!("{key} must be a boolean"))),
        None => Ok(None),
    }
}

fn require_i64(obj: &Map<String, Value>, key: &str) -> Result<i64, AppError> {
    match present(obj, key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| AppError::Validation(format!("{key} must be an integer"))),
        Some(_) => Err(AppError::Validation(format!("{key} must be an integer"))),
        None => Err(AppError::Validation(format!("{key} is required"))),
    }
}

fn optional_string_array(
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<String>>, AppError> {
    match present(obj, key) {
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    _ => {
                        return Err(AppError::Validation(format!(
                            "{key} must be an array of strings"
                        )))
                    }
                }
            }
            Ok(Some(out))
        }
        Some(_) => Err(AppError::Validation(format!("{key} must be an array"))),
        None => Ok(None),
    }
}

/// Metadata is opaque: any non-null JSON value passes through untouched.
fn metadata_field(obj: &Map<String, Value>, key: &str) -> Option<Value> {
    present(obj, key).cloned()
}

fn parse_role(v: &Value) -> Result<Role, AppError> {
    v.as_str()
        .and_then(Role::parse)
        .ok_or_else(|| AppError::Validation("role must be one of admin, user, guest".into()))
}

fn parse_status(v: &Value) -> Result<PostStatus, AppError> {
    v.as_str()
        .and_then(PostStatus::parse)
        .ok_or_else(|| {
            AppError::Validation("status must be one of draft, published, archived".into())
        })
}

fn check_email(email: &str) -> Result<(), AppError> {
    let re = Regex::new(EMAIL_PATTERN)
        .map_err(|_| AppError::Validation("invalid email pattern".into()))?;
    if !re.is_match(email) {
        return Err(AppError::Validation("email must be a valid address".into()));
    }
    Ok(())
}

fn title_field(obj: &Map<String, Value>) -> Result<String, AppError> {
    let title = require_string(obj, "title")?;
    check_title(&title)?;
    Ok(title)
}

fn check_title(title: &str) -> Result<(), AppError> {
    if title.len() > TITLE_MAX {
        return Err(AppError::Validation(format!(
            "title must be at most {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_user_applies_defaults() {
        let input = new_user(&json!({"name": "Ada", "email": "ada@example.com"})).unwrap();
        assert_eq!(input.role, Role::User);
        assert!(input.is_active);
        assert!(input.metadata.is_none());
        assert!(input.posts.is_empty());
    }

    #[test]
    fn new_user_keeps_submitted_values() {
        let input = new_user(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "role": "admin",
            "isActive": false,
            "metadata": {"team": "compilers"}
        }))
        .unwrap();
        assert_eq!(input.role, Role::Admin);
        assert!(!input.is_active);
        assert_eq!(input.metadata, Some(json!({"team": "compilers"})));
    }

    #[test]
    fn new_user_requires_name_and_email() {
        let err = new_user(&json!({"email": "ada@example.com"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "name is required"));
        let err = new_user(&json!({"name": "Ada"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "email is required"));
    }

    #[test]
    fn new_user_rejects_bad_email() {
        let err = new_user(&json!({"name": "Ada", "email": "not-an-email"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn new_user_rejects_unknown_role() {
        let err =
            new_user(&json!({"name": "Ada", "email": "a@b.co", "role": "root"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("role must be one of")));
    }

    #[test]
    fn new_user_accepts_inline_posts() {
        let input = new_user(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "posts": [{"title": "First", "tags": ["intro"]}]
        }))
        .unwrap();
        assert_eq!(input.posts.len(), 1);
        assert_eq!(input.posts[0].status, PostStatus::Draft);
        assert_eq!(input.posts[0].tags.as_deref(), Some(&["intro".to_string()][..]));
    }

    #[test]
    fn null_fields_count_as_absent() {
        let input = new_user(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "role": null,
            "metadata": null
        }))
        .unwrap();
        assert_eq!(input.role, Role::User);
        assert!(input.metadata.is_none());
    }

    #[test]
    fn non_object_body_is_bad_request() {
        let err = new_user(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn new_post_requires_author() {
        let err = new_post(&json!({"title": "Hello"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "authorId is required"));
        let err = new_post(&json!({"title": "Hello", "authorId": "1"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "authorId must be an integer"));
    }

    #[test]
    fn new_post_rejects_overlong_title() {
        let title = "x".repeat(TITLE_MAX + 1);
        let err = new_post(&json!({"title": title, "authorId": 1})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("at most")));
    }

    #[test]
    fn new_post_rejects_non_string_tags() {
        let err =
            new_post(&json!({"title": "Hello", "authorId": 1, "tags": ["a", 2]})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("array of strings")));
    }

    #[test]
    fn new_comment_requires_references() {
        let err = new_comment(&json!({"content": "Nice"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "postId is required"));
        let ok = new_comment(&json!({"content": "Nice", "postId": 4, "authorId": 2})).unwrap();
        assert_eq!(ok.post_id, 4);
        assert_eq!(ok.author_id, 2);
    }

    #[test]
    fn update_user_with_empty_body_changes_nothing() {
        let changes = update_user(&json!({})).unwrap();
        assert!(changes.name.is_none());
        assert!(changes.email.is_none());
        assert!(changes.role.is_none());
        assert!(changes.is_active.is_none());
    }

    #[test]
    fn update_user_validates_present_fields() {
        let err = update_user(&json!({"email": "nope"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = update_user(&json!({"name": ""})).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "name must not be empty"));
    }

    #[test]
    fn update_post_parses_status() {
        let changes = update_post(&json!({"status": "archived"})).unwrap();
        assert_eq!(changes.status, Some(PostStatus::Archived));
        let err = update_post(&json!({"status": "gone"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
