//! SQLite user store tests.

use vortex_domain::entities::Role;
use vortex_domain::ports::users::UserStore;
use vortex_infrastructure::db::SqliteUserStore;

async fn open_store() -> (SqliteUserStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteUserStore::open(&dir.path().join("security.db"))
        .await
        .expect("open");
    (store, dir)
}

#[tokio::test]
async fn create_and_find_round_trip() {
    let (store, _dir) = open_store().await;
    let created = store
        .create("alice", "$argon2id$fake", Role::Engineer)
        .await
        .expect("create");
    assert_eq!(created.username, "alice");
    assert!(created.is_active);
    assert!(created.last_login.is_none());

    let found = store.find("alice").await.expect("find").expect("present");
    assert_eq!(found.role, Role::Engineer);
    assert_eq!(found.password_hash, "$argon2id$fake");
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (store, _dir) = open_store().await;
    store
        .create("bob", "h", Role::Viewer)
        .await
        .expect("create");
    assert!(store.create("bob", "h", Role::Viewer).await.is_err());
}

#[tokio::test]
async fn touch_login_records_timestamp() {
    let (store, _dir) = open_store().await;
    store
        .create("carol", "h", Role::Analyst)
        .await
        .expect("create");
    store.touch_login("carol").await.expect("touch");

    let user = store.find("carol").await.expect("find").expect("present");
    assert!(user.last_login.is_some());
}

#[tokio::test]
async fn list_and_delete() {
    let (store, _dir) = open_store().await;
    store.create("a", "h", Role::Viewer).await.expect("create");
    store.create("b", "h", Role::Admin).await.expect("create");

    assert_eq!(store.list().await.expect("list").len(), 2);
    assert!(store.delete("a").await.expect("delete"));
    assert!(!store.delete("a").await.expect("delete missing"));
    assert_eq!(store.list().await.expect("list").len(), 1);
}
