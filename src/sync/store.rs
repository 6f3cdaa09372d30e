//! Embedded entity-link store. Records are JSON-encoded per entity tree;
//! links live in one tree indexed in both directions. All trees are
//! namespaced by the client application id, and writes are flushed before
//! returning.
//!
//! Referential cleanup is app-level: deleting a user walks its links and
//! removes the profile, authored posts, their comments, and every index
//! entry, mirroring the cascade the relational backend gets from foreign
//! keys. Multi-record writes are sequential, not transactional; per-key
//! operations (including the email reservation) are atomic.

use crate::error::AppError;
use crate::model::{NewUser, NewUserPost, PostStatus, Role, UpdateUser};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

use super::schema::{COMMENT_AUTHOR, COMMENT_POST, POST_AUTHOR, PROFILE_USER};

/// Merged account + profile record, the sync twin of the relational view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub metadata: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `author_id` is the authoring profile's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPost {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub status: PostStatus,
    pub author_id: String,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncComment {
    pub id: String,
    pub content: String,
    pub post_id: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccountRecord {
    id: String,
    email: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRecord {
    id: String,
    name: String,
    role: Role,
    metadata: Option<Value>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct SyncStore {
    db: sled::Db,
    users: sled::Tree,
    profiles: sled::Tree,
    posts: sled::Tree,
    comments: sled::Tree,
    links: sled::Tree,
    /// email -> user id, doubling as the uniqueness gate.
    emails: sled::Tree,
}

impl SyncStore {
    pub fn open(dir: &Path, app_id: &str) -> Result<SyncStore, AppError> {
        let db = sled::open(dir)?;
        let users = db.open_tree(format!("{app_id}/users"))?;
        let profiles = db.open_tree(format!("{app_id}/profiles"))?;
        let posts = db.open_tree(format!("{app_id}/posts"))?;
        let comments = db.open_tree(format!("{app_id}/comments"))?;
        let links = db.open_tree(format!("{app_id}/links"))?;
        let emails = db.open_tree(format!("{app_id}/emails"))?;
        Ok(SyncStore {
            db,
            users,
            profiles,
            posts,
            comments,
            links,
            emails,
        })
    }

    pub fn create_user(&self, input: &NewUser) -> Result<SyncUser, AppError> {
        let user_id = Uuid::new_v4().to_string();
        match self.emails.compare_and_swap(
            input.email.as_bytes(),
            None::<&[u8]>,
            Some(user_id.as_bytes()),
        )? {
            Ok(()) => {}
            Err(_) => {
                return Err(AppError::Conflict(format!(
                    "a user with email '{}' already exists",
                    input.email
                )))
            }
        }
        let now = Utc::now();
        let account = AccountRecord {
            id: user_id.clone(),
            email: input.email.clone(),
        };
        put_json(&self.users, &user_id, &account)?;
        let profile_id = Uuid::new_v4().to_string();
        let profile = ProfileRecord {
            id: profile_id.clone(),
            name: input.name.clone(),
            role: input.role,
            metadata: input.metadata.clone(),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        put_json(&self.profiles, &profile_id, &profile)?;
        self.link_put(PROFILE_USER, &profile_id, &user_id)?;
        for post in &input.posts {
            self.insert_post(&profile_id, post)?;
        }
        self.db.flush()?;
        Ok(merge_user(&account, &profile))
    }

    pub fn get_user(&self, id: &str) -> Result<Option<SyncUser>, AppError> {
        let Some(account) = get_json::<AccountRecord>(&self.users, id)? else {
            return Ok(None);
        };
        let Some((_, profile)) = self.profile_for_user(id)? else {
            return Ok(None);
        };
        Ok(Some(merge_user(&account, &profile)))
    }

    pub fn list_users(&self) -> Result<Vec<SyncUser>, AppError> {
        let mut out = Vec::new();
        for entry in self.users.iter() {
            let (_, bytes) = entry?;
            let account: AccountRecord = serde_json::from_slice(&bytes)?;
            if let Some((_, profile)) = self.profile_for_user(&account.id)? {
                out.push(merge_user(&account, &profile));
            }
        }
        Ok(out)
    }

    pub fn update_user(
        &self,
        id: &str,
        changes: &UpdateUser,
    ) -> Result<Option<SyncUser>, AppError> {
        let Some(mut account) = get_json::<AccountRecord>(&self.users, id)? else {
            return Ok(None);
        };
        let Some((profile_id, mut profile)) = self.profile_for_user(id)? else {
            return Ok(None);
        };
        if let Some(new_email) = &changes.email {
            if *new_email != account.email {
                match self.emails.compare_and_swap(
                    new_email.as_bytes(),
                    None::<&[u8]>,
                    Some(id.as_bytes()),
                )? {
                    Ok(()) => {
                        self.emails.remove(account.email.as_bytes())?;
                        account.email = new_email.clone();
                        put_json(&self.users, id, &account)?;
                    }
                    Err(_) => {
                        return Err(AppError::Conflict(format!(
                            "a user with email '{new_email}' already exists"
                        )))
                    }
                }
            }
        }
        if let Some(name) = &changes.name {
            profile.name = name.clone();
        }
        if let Some(role) = changes.role {
            profile.role = role;
        }
        if let Some(metadata) = &changes.metadata {
            profile.metadata = Some(metadata.clone());
        }
        if let Some(active) = changes.is_active {
            profile.is_active = active;
        }
        profile.updated_at = Utc::now();
        put_json(&self.profiles, &profile_id, &profile)?;
        self.db.flush()?;
        Ok(Some(merge_user(&account, &profile)))
    }

    pub fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let Some(account) = get_json::<AccountRecord>(&self.users, id)? else {
            return Ok(false);
        };
        if let Some((profile_id, _)) = self.profile_for_user(id)? {
            for post_id in self.link_sources(POST_AUTHOR, &profile_id)? {
                self.remove_post(&post_id)?;
            }
            for comment_id in self.link_sources(COMMENT_AUTHOR, &profile_id)? {
                self.remove_comment(&comment_id)?;
            }
            self.profiles.remove(profile_id.as_bytes())?;
            self.link_remove(PROFILE_USER, &profile_id, id)?;
        }
        self.emails.remove(account.email.as_bytes())?;
        self.users.remove(id.as_bytes())?;
        self.db.flush()?;
        Ok(true)
    }

    /// The profile id a merged user id resolves to.
    pub fn profile_id_for_user(&self, user_id: &str) -> Result<Option<String>, AppError> {
        Ok(self.profile_for_user(user_id)?.map(|(id, _)| id))
    }

    /// Create a post authored by `author_id` (a profile id).
    pub fn create_post(
        &self,
        author_id: &str,
        input: &NewUserPost,
    ) -> Result<SyncPost, AppError> {
        if get_json::<ProfileRecord>(&self.profiles, author_id)?.is_none() {
            return Err(AppError::BadRequest(format!(
                "author '{author_id}' does not exist"
            )));
        }
        let post = self.insert_post(author_id, input)?;
        self.db.flush()?;
        Ok(post)
    }

    pub fn get_post(&self, id: &str) -> Result<Option<SyncPost>, AppError> {
        get_json(&self.posts, id)
    }

    pub fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        if get_json::<SyncPost>(&self.posts, id)?.is_none() {
            return Ok(false);
        }
        self.remove_post(id)?;
        self.db.flush()?;
        Ok(true)
    }

    pub fn posts_by_author(&self, author_id: &str) -> Result<Vec<SyncPost>, AppError> {
        let mut out = Vec::new();
        for post_id in self.link_sources(POST_AUTHOR, author_id)? {
            if let Some(post) = get_json::<SyncPost>(&self.posts, &post_id)? {
                out.push(post);
            }
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    pub fn create_comment(
        &self,
        post_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<SyncComment, AppError> {
        if get_json::<SyncPost>(&self.posts, post_id)?.is_none() {
            return Err(AppError::BadRequest(format!(
                "post '{post_id}' does not exist"
            )));
        }
        if get_json::<ProfileRecord>(&self.profiles, author_id)?.is_none() {
            return Err(AppError::BadRequest(format!(
                "author '{author_id}' does not exist"
            )));
        }
        let comment = SyncComment {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now(),
        };
        put_json(&self.comments, &comment.id, &comment)?;
        self.link_put(COMMENT_POST, &comment.id, post_id)?;
        self.link_put(COMMENT_AUTHOR, &comment.id, author_id)?;
        self.db.flush()?;
        Ok(comment)
    }

    pub fn comments_for_post(&self, post_id: &str) -> Result<Vec<SyncComment>, AppError> {
        let mut out = Vec::new();
        for comment_id in self.link_sources(COMMENT_POST, post_id)? {
            if let Some(comment) = get_json::<SyncComment>(&self.comments, &comment_id)? {
                out.push(comment);
            }
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    fn insert_post(&self, author_id: &str, input: &NewUserPost) -> Result<SyncPost, AppError> {
        let now = Utc::now();
        let post = SyncPost {
            id: Uuid::new_v4().to_string(),
            title: input.title.clone(),
            content: input.content.clone(),
            status: input.status,
            author_id: author_id.to_string(),
            tags: input.tags.clone(),
            metadata: input.metadata.clone(),
            created_at: now,
            updated_at: now,
        };
        put_json(&self.posts, &post.id, &post)?;
        self.link_put(POST_AUTHOR, &post.id, author_id)?;
        Ok(post)
    }

    fn remove_post(&self, post_id: &str) -> Result<(), AppError> {
        if let Some(post) = get_json::<SyncPost>(&self.posts, post_id)? {
            for comment_id in self.link_sources(COMMENT_POST, post_id)? {
                self.remove_comment(&comment_id)?;
            }
            self.link_remove(POST_AUTHOR, post_id, &post.author_id)?;
            self.posts.remove(post_id.as_bytes())?;
        }
        Ok(())
    }

    fn remove_comment(&self, comment_id: &str) -> Result<(), AppError> {
        if let Some(comment) = get_json::<SyncComment>(&self.comments, comment_id)? {
            self.link_remove(COMMENT_POST, comment_id, &comment.post_id)?;
            self.link_remove(COMMENT_AUTHOR, comment_id, &comment.author_id)?;
            self.comments.remove(comment_id.as_bytes())?;
        }
        Ok(())
    }

    fn profile_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<(String, ProfileRecord)>, AppError> {
        for profile_id in self.link_sources(PROFILE_USER, user_id)? {
            if let Some(profile) = get_json::<ProfileRecord>(&self.profiles, &profile_id)? {
                return Ok(Some((profile_id, profile)));
            }
        }
        Ok(None)
    }

    fn link_put(&self, link: &str, from: &str, to: &str) -> Result<(), AppError> {
        self.links
            .insert(format!("f/{link}/{from}/{to}"), to.as_bytes())?;
        self.links
            .insert(format!("r/{link}/{to}/{from}"), from.as_bytes())?;
        Ok(())
    }

    fn link_remove(&self, link: &str, from: &str, to: &str) -> Result<(), AppError> {
        self.links.remove(format!("f/{link}/{from}/{to}"))?;
        self.links.remove(format!("r/{link}/{to}/{from}"))?;
        Ok(())
    }

    /// Ids on the forward end pointing at `to` (e.g. all posts whose
    /// `post_author` link targets a given profile).
    fn link_sources(&self, link: &str, to: &str) -> Result<Vec<String>, AppError> {
        let prefix = format!("r/{link}/{to}/");
        let mut out = Vec::new();
        for entry in self.links.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry?;
            out.push(String::from_utf8_lossy(&value).into_owned());
        }
        Ok(out)
    }
}

fn put_json<T: Serialize>(tree: &sled::Tree, id: &str, value: &T) -> Result<(), AppError> {
    let bytes = serde_json::to_vec(value)?;
    tree.insert(id.as_bytes(), bytes)?;
    Ok(())
}

fn get_json<T: DeserializeOwned>(tree: &sled::Tree, id: &str) -> Result<Option<T>, AppError> {
    match tree.get(id.as_bytes())? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn merge_user(account: &AccountRecord, profile: &ProfileRecord) -> SyncUser {
    SyncUser {
        id: account.id.clone(),
        email: account.email.clone(),
        name: profile.name.clone(),
        role: profile.role,
        metadata: profile.metadata.clone(),
        is_active: profile.is_active,
        created_at: profile.created_at,
        updated_at: profile.updated_at,
    }
}
