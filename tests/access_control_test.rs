//! Visibility and ownership enforcement, exercised the way the handlers
//! compose it: resolve the entity first (NotFound), then apply the rule.

use tempfile::TempDir;

use tinta::access::{policy, PostScope};
use tinta::db::models::{PostView, Role, Visibility};
use tinta::db::{self, posts, users};
use tinta::error::AppError;
use tinta::extractors::CurrentUser;
use tinta::state::DbPool;

fn test_pool() -> (TempDir, DbPool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    (temp_dir, pool)
}

/// Register an account and return the capability struct a login would
/// snapshot for it.
fn register(pool: &DbPool, username: &str) -> CurrentUser {
    let conn = pool.get().unwrap();
    let id = users::create(&conn, username, "hash").unwrap();
    CurrentUser {
        id,
        username: username.to_string(),
        role: Role::User,
    }
}

fn register_admin(pool: &DbPool, username: &str) -> CurrentUser {
    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, 'hash', 'admin')",
        rusqlite::params![username],
    )
    .unwrap();
    CurrentUser {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        role: Role::Admin,
    }
}

fn write_post(pool: &DbPool, author: &CurrentUser, title: &str, visibility: Visibility) -> i64 {
    let conn = pool.get().unwrap();
    posts::create(&conn, author.id, title, "content", visibility).unwrap()
}

/// The single-post read path: NotFound before any visibility rule.
fn get_post(pool: &DbPool, user: &CurrentUser, id: i64) -> Result<PostView, AppError> {
    let conn = pool.get().unwrap();
    let post = posts::get_view(&conn, id)?.ok_or(AppError::NotFound)?;
    policy::can_read_post(user, post.author_id, post.visibility)?;
    Ok(post)
}

/// The post mutation gate: NotFound, then author-or-admin.
fn authorize_edit(pool: &DbPool, user: &CurrentUser, id: i64) -> Result<(), AppError> {
    let conn = pool.get().unwrap();
    let post = posts::get(&conn, id)?.ok_or(AppError::NotFound)?;
    policy::can_edit_post(user, post.author_id)
}

#[test]
fn private_post_is_soft_denied_to_strangers() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");

    let post_id = write_post(&pool, &alice, "Secret", Visibility::Private);

    let err = get_post(&pool, &bob, post_id).unwrap_err();
    assert!(matches!(err, AppError::PrivatePost));
}

#[test]
fn author_and_admin_read_private_posts() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let root = register_admin(&pool, "root");

    let post_id = write_post(&pool, &alice, "Secret", Visibility::Private);

    assert_eq!(get_post(&pool, &alice, post_id).unwrap().title, "Secret");
    assert_eq!(get_post(&pool, &root, post_id).unwrap().title, "Secret");
}

#[test]
fn missing_post_is_not_found_before_any_rule() {
    let (_tmp, pool) = test_pool();
    let bob = register(&pool, "bob");

    // A nonexistent id must never surface as a denial kind
    assert!(matches!(
        get_post(&pool, &bob, 4242).unwrap_err(),
        AppError::NotFound
    ));
    assert!(matches!(
        authorize_edit(&pool, &bob, 4242).unwrap_err(),
        AppError::NotFound
    ));
}

#[test]
fn feed_excludes_other_peoples_private_posts_for_every_role() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");
    let root = register_admin(&pool, "root");

    write_post(&pool, &alice, "Alice public", Visibility::Public);
    write_post(&pool, &alice, "Alice secret", Visibility::Private);
    write_post(&pool, &bob, "Bob public", Visibility::Public);

    let conn = pool.get().unwrap();
    for viewer in [&alice, &bob, &root] {
        let feed = posts::list(&conn, &PostScope::public_feed(None)).unwrap();
        let titles: Vec<&str> = feed.iter().map(|p| p.title.as_str()).collect();
        assert!(
            !titles.contains(&"Alice secret"),
            "private post leaked into the feed for {}",
            viewer.username
        );
        assert_eq!(titles.len(), 2);
    }
}

#[test]
fn admin_sees_all_posts_in_dashboard_but_not_in_feed() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let root = register_admin(&pool, "root");

    write_post(&pool, &alice, "Alice secret", Visibility::Private);

    let conn = pool.get().unwrap();

    // Management view: every author, private included
    let dashboard = posts::list(&conn, &PostScope::dashboard(&root)).unwrap();
    assert_eq!(dashboard.len(), 1);
    assert_eq!(dashboard[0].title, "Alice secret");

    // Public feed: the same post stays invisible
    let feed = posts::list(&conn, &PostScope::public_feed(None)).unwrap();
    assert!(feed.is_empty());
}

#[test]
fn dashboard_of_plain_user_is_own_posts_only() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");

    write_post(&pool, &alice, "Mine", Visibility::Private);
    write_post(&pool, &bob, "Not mine", Visibility::Public);

    let conn = pool.get().unwrap();
    let dashboard = posts::list(&conn, &PostScope::dashboard(&alice)).unwrap();
    let titles: Vec<&str> = dashboard.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Mine"]);
}

#[test]
fn strangers_cannot_mutate_posts() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");

    let post_id = write_post(&pool, &alice, "Original", Visibility::Public);

    let err = authorize_edit(&pool, &bob, post_id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // The row is untouched
    let conn = pool.get().unwrap();
    let post = posts::get(&conn, post_id).unwrap().unwrap();
    assert_eq!(post.title, "Original");
}

#[test]
fn author_and_admin_may_mutate() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let root = register_admin(&pool, "root");

    let post_id = write_post(&pool, &alice, "Original", Visibility::Public);

    assert!(authorize_edit(&pool, &alice, post_id).is_ok());
    assert!(authorize_edit(&pool, &root, post_id).is_ok());

    let conn = pool.get().unwrap();
    posts::update(&conn, post_id, "Edited", "content", Visibility::Private).unwrap();
    let post = posts::get(&conn, post_id).unwrap().unwrap();
    assert_eq!(post.title, "Edited");
    assert_eq!(post.author_id, alice.id);
}

#[test]
fn post_author_always_comes_from_the_session() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");

    // A client-supplied author field does not even deserialize into the
    // form; the insert takes its author from the session alone.
    let form: tinta::routes::posts::PostForm = serde_json::from_str(
        r#"{"title":"X","content":"c","visibility":"public","author_id":9999}"#,
    )
    .unwrap();

    let conn = pool.get().unwrap();
    let visibility = Visibility::parse(form.visibility.as_deref().unwrap_or(""));
    let post_id = posts::create(&conn, alice.id, &form.title, &form.content, visibility).unwrap();

    let post = posts::get(&conn, post_id).unwrap().unwrap();
    assert_eq!(post.author_id, alice.id);
}

#[test]
fn unrecognized_visibility_defaults_to_public() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");

    let conn = pool.get().unwrap();
    let post_id = posts::create(
        &conn,
        alice.id,
        "T",
        "c",
        Visibility::parse("friends-only"),
    )
    .unwrap();

    let post = posts::get(&conn, post_id).unwrap().unwrap();
    assert_eq!(post.visibility, Visibility::Public);
}

#[test]
fn profile_access_is_owner_or_admin() {
    let (_tmp, pool) = test_pool();
    let alice = register(&pool, "alice");
    let bob = register(&pool, "bob");
    let root = register_admin(&pool, "root");

    assert!(policy::can_touch_profile(&alice, alice.id).is_ok());
    assert!(policy::can_touch_profile(&root, alice.id).is_ok());
    assert!(matches!(
        policy::can_touch_profile(&bob, alice.id).unwrap_err(),
        AppError::Forbidden
    ));
}

/// Spec walkthrough: A's private post is soft-denied to B, readable by
/// the admin, absent from B's feed, present in A's own listing.
#[test]
fn private_post_scenario() {
    let (_tmp, pool) = test_pool();
    let a = register(&pool, "a");
    let b = register(&pool, "b");
    let root = register_admin(&pool, "root");

    let post_id = write_post(&pool, &a, "X", Visibility::Private);

    // B: soft denial
    assert!(matches!(
        get_post(&pool, &b, post_id).unwrap_err(),
        AppError::PrivatePost
    ));

    // Admin: success
    assert_eq!(get_post(&pool, &root, post_id).unwrap().title, "X");

    let conn = pool.get().unwrap();

    // B's feed: absent
    let feed = posts::list(&conn, &PostScope::public_feed(None)).unwrap();
    assert!(feed.iter().all(|p| p.title != "X"));

    // A's own listing: present
    let mine = posts::list(&conn, &PostScope::dashboard(&a)).unwrap();
    assert!(mine.iter().any(|p| p.title == "X"));
}
