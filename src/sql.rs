//! SQL for the data-access layer: static statements for single-row
//! operations, composed builders for filtered list queries. Identifiers are
//! fixed at compile time; values always travel as bind parameters.

use crate::model::{PostStatus, Role, UpdatePost, UpdateUser};
use sqlx::{Postgres, QueryBuilder};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

pub const INSERT_USER: &str = "INSERT INTO users (email) VALUES ($1) RETURNING id, email";

pub const INSERT_PROFILE: &str = "INSERT INTO profiles (user_id, name, role, metadata, is_active) \
     VALUES ($1, $2, $3, $4, $5) \
     RETURNING user_id, name, role, metadata, is_active, created_at, updated_at";

const USER_SELECT: &str = "SELECT u.id, u.email, p.name, p.role, p.metadata, p.is_active, \
     p.created_at, p.updated_at FROM users u JOIN profiles p ON p.user_id = u.id";

pub const SELECT_USER_BY_ID: &str = "SELECT u.id, u.email, p.name, p.role, p.metadata, p.is_active, \
     p.created_at, p.updated_at FROM users u JOIN profiles p ON p.user_id = u.id WHERE u.id = $1";

pub const UPDATE_ACCOUNT_EMAIL: &str = "UPDATE users SET email = $1 WHERE id = $2";

pub const DELETE_USER: &str = "DELETE FROM users WHERE id = $1 RETURNING id";

pub const USERS_WITH_POST_COUNT: &str = "SELECT u.id, u.email, p.name, p.role, COUNT(po.id) AS post_count \
     FROM users u JOIN profiles p ON p.user_id = u.id \
     LEFT JOIN posts po ON po.author_id = u.id \
     GROUP BY u.id, u.email, p.name, p.role ORDER BY u.id";

const POST_COLUMNS: &str =
    "id, title, content, status, author_id, tags, metadata, created_at, updated_at";

pub const INSERT_POST: &str = "INSERT INTO posts (title, content, status, author_id, tags, metadata) \
     VALUES ($1, $2, $3, $4, $5, $6) \
     RETURNING id, title, content, status, author_id, tags, metadata, created_at, updated_at";

pub const SELECT_POST_BY_ID: &str = "SELECT id, title, content, status, author_id, tags, metadata, \
     created_at, updated_at FROM posts WHERE id = $1";

pub const DELETE_POST: &str = "DELETE FROM posts WHERE id = $1 RETURNING id";

pub const INSERT_COMMENT: &str = "INSERT INTO comments (content, post_id, author_id) \
     VALUES ($1, $2, $3) RETURNING id, content, post_id, author_id, created_at";

pub const SELECT_COMMENT_BY_ID: &str =
    "SELECT id, content, post_id, author_id, created_at FROM comments WHERE id = $1";

pub const DELETE_COMMENT: &str = "DELETE FROM comments WHERE id = $1 RETURNING id";

#[derive(Debug, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub author: Option<i64>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Default)]
pub struct CommentFilter {
    pub post: Option<i64>,
    pub author: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn effective_limit(limit: Option<u32>) -> i64 {
    i64::from(limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT))
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, first: &mut bool) {
    if *first {
        qb.push(" WHERE ");
        *first = false;
    } else {
        qb.push(" AND ");
    }
}

fn push_page(qb: &mut QueryBuilder<'static, Postgres>, limit: Option<u32>, offset: Option<u32>) {
    qb.push(" LIMIT ").push_bind(effective_limit(limit));
    qb.push(" OFFSET ").push_bind(i64::from(offset.unwrap_or(0)));
}

pub fn select_users(filter: &UserFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(USER_SELECT);
    let mut first = true;
    if let Some(role) = filter.role {
        push_predicate(&mut qb, &mut first);
        qb.push("p.role = ").push_bind(role);
    }
    if let Some(active) = filter.is_active {
        push_predicate(&mut qb, &mut first);
        qb.push("p.is_active = ").push_bind(active);
    }
    qb.push(" ORDER BY u.id");
    push_page(&mut qb, filter.limit, filter.offset);
    qb
}

pub fn select_posts(filter: &PostFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts"));
    let mut first = true;
    if let Some(status) = filter.status {
        push_predicate(&mut qb, &mut first);
        qb.push("status = ").push_bind(status);
    }
    if let Some(author) = filter.author {
        push_predicate(&mut qb, &mut first);
        qb.push("author_id = ").push_bind(author);
    }
    if let Some(tag) = &filter.tag {
        push_predicate(&mut qb, &mut first);
        qb.push_bind(tag.clone());
        qb.push(" = ANY(tags)");
    }
    if let Some(search) = &filter.search {
        push_predicate(&mut qb, &mut first);
        qb.push("to_tsvector('english', title || ' ' || coalesce(content, '')) @@ plainto_tsquery('english', ");
        qb.push_bind(search.clone());
        qb.push(")");
    }
    qb.push(" ORDER BY id");
    push_page(&mut qb, filter.limit, filter.offset);
    qb
}

pub fn select_comments(filter: &CommentFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb =
        QueryBuilder::new("SELECT id, content, post_id, author_id, created_at FROM comments");
    let mut first = true;
    if let Some(post) = filter.post {
        push_predicate(&mut qb, &mut first);
        qb.push("post_id = ").push_bind(post);
    }
    if let Some(author) = filter.author {
        push_predicate(&mut qb, &mut first);
        qb.push("author_id = ").push_bind(author);
    }
    qb.push(" ORDER BY id");
    push_page(&mut qb, filter.limit, filter.offset);
    qb
}

fn push_set(qb: &mut QueryBuilder<'static, Postgres>, any: &mut bool) {
    if *any {
        qb.push(", ");
    }
    *any = true;
}

/// UPDATE for the profile half of a user. `updated_at` is always refreshed,
/// so an empty change set still touches the row. Email lives on the account
/// row and is updated separately.
pub fn update_profile(user_id: i64, changes: &UpdateUser) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE profiles SET ");
    let mut any = false;
    if let Some(name) = &changes.name {
        push_set(&mut qb, &mut any);
        qb.push("name = ").push_bind(name.clone());
    }
    if let Some(role) = changes.role {
        push_set(&mut qb, &mut any);
        qb.push("role = ").push_bind(role);
    }
    if let Some(metadata) = &changes.metadata {
        push_set(&mut qb, &mut any);
        qb.push("metadata = ").push_bind(metadata.clone());
    }
    if let Some(active) = changes.is_active {
        push_set(&mut qb, &mut any);
        qb.push("is_active = ").push_bind(active);
    }
    push_set(&mut qb, &mut any);
    qb.push("updated_at = NOW()");
    qb.push(" WHERE user_id = ").push_bind(user_id);
    qb.push(" RETURNING user_id");
    qb
}

pub fn update_post(id: i64, changes: &UpdatePost) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE posts SET ");
    let mut any = false;
    if let Some(title) = &changes.title {
        push_set(&mut qb, &mut any);
        qb.push("title = ").push_bind(title.clone());
    }
    if let Some(content) = &changes.content {
        push_set(&mut qb, &mut any);
        qb.push("content = ").push_bind(content.clone());
    }
    if let Some(status) = changes.status {
        push_set(&mut qb, &mut any);
        qb.push("status = ").push_bind(status);
    }
    if let Some(tags) = &changes.tags {
        push_set(&mut qb, &mut any);
        qb.push("tags = ").push_bind(tags.clone());
    }
    if let Some(metadata) = &changes.metadata {
        push_set(&mut qb, &mut any);
        qb.push("metadata = ").push_bind(metadata.clone());
    }
    push_set(&mut qb, &mut any);
    qb.push("updated_at = NOW()");
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(format!(" RETURNING {POST_COLUMNS}"));
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_users_without_filters_pages_only() {
        let qb = select_users(&UserFilter::default());
        assert_eq!(
            qb.sql(),
            format!("{USER_SELECT} ORDER BY u.id LIMIT $1 OFFSET $2")
        );
    }

    #[test]
    fn select_users_with_filters_chains_predicates() {
        let filter = UserFilter {
            role: Some(Role::Admin),
            is_active: Some(true),
            ..Default::default()
        };
        let qb = select_users(&filter);
        assert_eq!(
            qb.sql(),
            format!(
                "{USER_SELECT} WHERE p.role = $1 AND p.is_active = $2 ORDER BY u.id LIMIT $3 OFFSET $4"
            )
        );
    }

    #[test]
    fn select_posts_search_uses_full_text_match() {
        let filter = PostFilter {
            search: Some("postgres".into()),
            ..Default::default()
        };
        let qb = select_posts(&filter);
        assert!(qb.sql().contains("plainto_tsquery('english', $1)"));
        assert!(qb.sql().contains("to_tsvector"));
    }

    #[test]
    fn select_posts_tag_uses_array_membership() {
        let filter = PostFilter {
            status: Some(PostStatus::Published),
            tag: Some("rust".into()),
            ..Default::default()
        };
        let qb = select_posts(&filter);
        assert!(qb.sql().contains("WHERE status = $1 AND $2 = ANY(tags)"));
    }

    #[test]
    fn select_comments_filters_by_post_and_author() {
        let filter = CommentFilter {
            post: Some(7),
            author: Some(3),
            ..Default::default()
        };
        let qb = select_comments(&filter);
        assert!(qb
            .sql()
            .contains("WHERE post_id = $1 AND author_id = $2 ORDER BY id"));
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(effective_limit(Some(5000)), i64::from(MAX_LIMIT));
        assert_eq!(effective_limit(None), i64::from(DEFAULT_LIMIT));
        assert_eq!(effective_limit(Some(10)), 10);
    }

    #[test]
    fn update_profile_always_refreshes_timestamp() {
        let qb = update_profile(9, &UpdateUser::default());
        assert_eq!(
            qb.sql(),
            "UPDATE profiles SET updated_at = NOW() WHERE user_id = $1 RETURNING user_id"
        );
    }

    #[test]
    fn update_profile_sets_present_fields_only() {
        let changes = UpdateUser {
            name: Some("Grace".into()),
            is_active: Some(false),
            ..Default::default()
        };
        let qb = update_profile(9, &changes);
        assert_eq!(
            qb.sql(),
            "UPDATE profiles SET name = $1, is_active = $2, updated_at = NOW() \
             WHERE user_id = $3 RETURNING user_id"
        );
    }

    #[test]
    fn update_post_sets_present_fields_only() {
        let changes = UpdatePost {
            status: Some(PostStatus::Archived),
            ..Default::default()
        };
        let qb = update_post(4, &changes);
        assert!(qb
            .sql()
            .starts_with("UPDATE posts SET status = $1, updated_at = NOW() WHERE id = $2"));
    }
}
