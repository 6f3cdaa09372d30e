//! End-to-end exercises of the embedded entity-link store.

use postboard::error::AppError;
use postboard::model::{NewUser, NewUserPost, PostStatus, Role, UpdateUser};
use postboard::SyncStore;
use serde_json::json;
use tempfile::tempdir;

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.into(),
        email: email.into(),
        role: Role::default(),
        metadata: None,
        is_active: true,
        posts: Vec::new(),
    }
}

fn new_post(title: &str) -> NewUserPost {
    NewUserPost {
        title: title.into(),
        content: None,
        status: PostStatus::default(),
        tags: None,
        metadata: None,
    }
}

fn open_store(dir: &tempfile::TempDir) -> SyncStore {
    SyncStore::open(dir.path(), "test-app").unwrap()
}

#[test]
fn create_applies_submitted_values_and_defaults() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let user = store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    assert_eq!(user.name, "Ada");
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.role, Role::User);
    assert!(user.is_active);
    assert!(user.metadata.is_none());
    assert!(user.updated_at >= user.created_at);

    let mut input = new_user("Grace", "grace@example.com");
    input.role = Role::Admin;
    input.is_active = false;
    input.metadata = Some(json!({"team": "compilers"}));
    let user = store.create_user(&input).unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(!user.is_active);
    assert_eq!(user.metadata, Some(json!({"team": "compilers"})));
}

#[test]
fn duplicate_email_is_a_conflict() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    let err = store
        .create_user(&new_user("Imposter", "ada@example.com"))
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.list_users().unwrap().len(), 1);
}

#[test]
fn missing_ids_resolve_to_none() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let ghost = uuid::Uuid::new_v4().to_string();
    assert!(store.get_user(&ghost).unwrap().is_none());
    assert!(store.get_post(&ghost).unwrap().is_none());
    assert!(!store.delete_user(&ghost).unwrap());
    assert!(store.update_user(&ghost, &UpdateUser::default()).unwrap().is_none());
}

#[test]
fn update_refreshes_updated_at_and_keeps_untouched_fields() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let created = store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    let changes = UpdateUser {
        name: Some("Ada Lovelace".into()),
        ..Default::default()
    };
    let updated = store.update_user(&created.id, &changes).unwrap().unwrap();
    assert_eq!(updated.name, "Ada Lovelace");
    assert_eq!(updated.email, "ada@example.com");
    assert_eq!(updated.role, created.role);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= updated.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[test]
fn update_to_taken_email_is_a_conflict() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    let grace = store.create_user(&new_user("Grace", "grace@example.com")).unwrap();
    let changes = UpdateUser {
        email: Some("ada@example.com".into()),
        ..Default::default()
    };
    let err = store.update_user(&grace.id, &changes).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // the old address still belongs to grace
    let changes = UpdateUser {
        email: Some("hopper@example.com".into()),
        ..Default::default()
    };
    let updated = store.update_user(&grace.id, &changes).unwrap().unwrap();
    assert_eq!(updated.email, "hopper@example.com");
}

#[test]
fn inline_posts_are_created_and_linked() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let mut input = new_user("Ada", "ada@example.com");
    input.posts = vec![new_post("Notes"), new_post("Engines")];
    let user = store.create_user(&input).unwrap();

    let profile_id = store.profile_id_for_user(&user.id).unwrap().unwrap();
    let posts = store.posts_by_author(&profile_id).unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.author_id == profile_id));
    assert!(posts.iter().all(|p| p.status == PostStatus::Draft));
}

#[test]
fn comments_require_existing_post_and_author() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let user = store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    let profile_id = store.profile_id_for_user(&user.id).unwrap().unwrap();
    let post = store.create_post(&profile_id, &new_post("Notes")).unwrap();

    let comment = store.create_comment(&post.id, &profile_id, "First!").unwrap();
    assert_eq!(comment.post_id, post.id);
    assert_eq!(store.comments_for_post(&post.id).unwrap().len(), 1);

    let ghost = uuid::Uuid::new_v4().to_string();
    let err = store.create_comment(&ghost, &profile_id, "nope").unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let err = store.create_comment(&post.id, &ghost, "nope").unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn unknown_author_cannot_post() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let ghost = uuid::Uuid::new_v4().to_string();
    let err = store.create_post(&ghost, &new_post("Orphan")).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn delete_cascades_through_posts_and_comments() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let ada = store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    let grace = store.create_user(&new_user("Grace", "grace@example.com")).unwrap();
    let ada_profile = store.profile_id_for_user(&ada.id).unwrap().unwrap();
    let grace_profile = store.profile_id_for_user(&grace.id).unwrap().unwrap();

    let post = store.create_post(&ada_profile, &new_post("Notes")).unwrap();
    store.create_comment(&post.id, &grace_profile, "Nice").unwrap();

    assert!(store.delete_user(&ada.id).unwrap());
    assert!(store.get_user(&ada.id).unwrap().is_none());
    assert!(store.get_post(&post.id).unwrap().is_none());
    assert!(store.comments_for_post(&post.id).unwrap().is_empty());
    // commenter survives the cascade
    assert!(store.get_user(&grace.id).unwrap().is_some());
}

#[test]
fn deleting_a_commenter_leaves_the_post() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let ada = store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    let grace = store.create_user(&new_user("Grace", "grace@example.com")).unwrap();
    let ada_profile = store.profile_id_for_user(&ada.id).unwrap().unwrap();
    let grace_profile = store.profile_id_for_user(&grace.id).unwrap().unwrap();

    let post = store.create_post(&ada_profile, &new_post("Notes")).unwrap();
    store.create_comment(&post.id, &grace_profile, "Nice").unwrap();

    assert!(store.delete_user(&grace.id).unwrap());
    assert!(store.get_post(&post.id).unwrap().is_some());
    assert!(store.comments_for_post(&post.id).unwrap().is_empty());
}

#[test]
fn email_is_reusable_after_delete() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let ada = store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    assert!(store.delete_user(&ada.id).unwrap());
    let again = store.create_user(&new_user("Ada II", "ada@example.com")).unwrap();
    assert_ne!(again.id, ada.id);
}

#[test]
fn list_returns_every_user() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    store.create_user(&new_user("Ada", "ada@example.com")).unwrap();
    store.create_user(&new_user("Grace", "grace@example.com")).unwrap();
    let users = store.list_users().unwrap();
    assert_eq!(users.len(), 2);
}
