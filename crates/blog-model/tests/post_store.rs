use std::collections::BTreeSet;

use blog_model::{
    AuthorStore, CategoryStore, ModelError, NewPost, PostChanges, PostStore, TagStore,
};
use blog_types::{ValidationError, MAX_TITLE_LEN};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;

struct Fixture {
    conn: Connection,
    author_id: i64,
    django: i64,
    python: i64,
}

fn setup() -> Fixture {
    let conn = Connection::open_in_memory().expect("should open in-memory db");
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .expect("should enable foreign keys");
    blog_db::run_migrations(&conn).expect("migrations should succeed");

    let author_id = conn.create_author("dreamer").unwrap().id;
    let django = conn.create_category("Django").unwrap().id;
    let python = conn.create_category("Python").unwrap().id;
    Fixture {
        conn,
        author_id,
        django,
        python,
    }
}

fn post_at(f: &Fixture, title: &str, day: u32) -> NewPost {
    let mut new = NewPost::new(title, format!("text of {title}"), f.django, f.author_id);
    new.created_time = Some(Utc.with_ymd_and_hms(2016, 12, day, 0, 0, 0).unwrap());
    new
}

#[test]
fn created_post_reads_back_with_matching_fields() {
    let f = setup();
    let mut new = post_at(&f, "title 1", 23);
    new.excerpt = Some("a short summary".to_string());

    let created = f.conn.create_post(&new).expect("create should succeed");
    let fetched = f.conn.get_post(created.id).expect("post should exist");

    assert_eq!(fetched, created);
    assert_eq!(fetched.title, "title 1");
    assert_eq!(fetched.body, "text of title 1");
    assert_eq!(fetched.excerpt, "a short summary");
    assert_eq!(fetched.category_id, f.django);
    assert_eq!(fetched.author_id, f.author_id);
    assert_eq!(fetched.created_time, fetched.modified_time);
    assert_eq!(
        fetched.created_time,
        Utc.with_ymd_and_hms(2016, 12, 23, 0, 0, 0).unwrap()
    );
}

#[test]
fn absent_excerpt_is_stored_empty() {
    let f = setup();
    let post = f.conn.create_post(&post_at(&f, "no excerpt", 1)).unwrap();
    assert_eq!(post.excerpt, "");

    let raw: Option<String> = f
        .conn
        .query_row("SELECT excerpt FROM posts WHERE id = ?1", [post.id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(raw.as_deref(), Some(""));
}

#[test]
fn never_assigned_id_is_not_found() {
    let f = setup();
    let err = f.conn.get_post(12345).unwrap_err();
    assert!(matches!(
        err,
        ModelError::NotFound {
            entity: "post",
            id: 12345
        }
    ));
    assert!(f.conn.get_post_detail(12345).unwrap_err().is_not_found());
}

#[test]
fn missing_category_blocks_the_write() {
    let f = setup();
    let mut new = post_at(&f, "orphan", 1);
    new.category_id = 999;

    let err = f.conn.create_post(&new).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::MissingCategory(999))
    ));
    assert!(f.conn.list_posts().unwrap().is_empty());
}

#[test]
fn missing_author_blocks_the_write() {
    let f = setup();
    let mut new = post_at(&f, "ghost written", 1);
    new.author_id = 77;

    let err = f.conn.create_post(&new).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::MissingAuthor(77))
    ));
    assert!(f.conn.list_posts().unwrap().is_empty());
}

#[test]
fn missing_tag_blocks_the_write() {
    let f = setup();
    let web = f.conn.create_tag("web").unwrap();
    let mut new = post_at(&f, "tagged", 1);
    new.tag_ids = BTreeSet::from([web.id, 404]);

    let err = f.conn.create_post(&new).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::MissingTag(404))
    ));
    assert!(f.conn.list_posts().unwrap().is_empty());
}

#[test]
fn oversized_title_blocks_the_write() {
    let f = setup();
    let new = post_at(&f, &"t".repeat(MAX_TITLE_LEN + 1), 1);

    let err = f.conn.create_post(&new).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::TooLong { field: "title", .. })
    ));
}

#[test]
fn created_time_beyond_year_9999_is_a_validation_error() {
    let f = setup();
    let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
    let mut new = post_at(&f, "from the future", 1);
    new.created_time = Some(far);

    let err = f.conn.create_post(&new).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::TimestampOutOfRange(at)) if at == far
    ));
    assert!(f.conn.list_posts().unwrap().is_empty());
}

#[test]
fn created_time_at_year_9999_lists_after_earlier_posts() {
    let f = setup();
    let early = f.conn.create_post(&post_at(&f, "early", 1)).unwrap();
    let mut new = post_at(&f, "last possible", 1);
    new.created_time = Some(Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap());
    let late = f.conn.create_post(&new).unwrap();

    assert_eq!(f.conn.get_post(late.id).unwrap(), late);
    let ids: Vec<i64> = f.conn.list_posts().unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![late.id, early.id]);
}

#[test]
fn stored_references_always_resolve() {
    let f = setup();
    for day in 1..=3 {
        f.conn
            .create_post(&post_at(&f, &format!("post {day}"), day))
            .unwrap();
    }

    for post in f.conn.list_posts().unwrap() {
        assert!(f.conn.get_category(post.category_id).is_ok());
        assert!(f.conn.get_author(post.author_id).is_ok());
    }
}

#[test]
fn listing_returns_each_post_once_newest_first() {
    let f = setup();
    let oldest = f.conn.create_post(&post_at(&f, "oldest", 23)).unwrap();
    let newest = f.conn.create_post(&post_at(&f, "newest", 26)).unwrap();
    let middle = f.conn.create_post(&post_at(&f, "middle", 24)).unwrap();
    // Same timestamp as `middle`: the higher id lists first.
    let twin = f.conn.create_post(&post_at(&f, "twin", 24)).unwrap();

    let ids: Vec<i64> = f.conn.list_posts().unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![newest.id, twin.id, middle.id, oldest.id]);
}

#[test]
fn tag_set_has_no_duplicates_regardless_of_order() {
    let f = setup();
    let t1 = f.conn.create_tag("T1").unwrap();
    let t2 = f.conn.create_tag("T2").unwrap();

    let a = f.conn.create_post(&post_at(&f, "a", 1)).unwrap();
    f.conn.add_tag(a.id, t1.id).unwrap();
    f.conn.add_tag(a.id, t2.id).unwrap();

    let b = f.conn.create_post(&post_at(&f, "b", 2)).unwrap();
    f.conn.add_tag(b.id, t2.id).unwrap();
    f.conn.add_tag(b.id, t1.id).unwrap();
    f.conn.add_tag(b.id, t2.id).unwrap();

    let expected = BTreeSet::from([t1.id, t2.id]);
    assert_eq!(f.conn.get_post(a.id).unwrap().tag_ids, expected);
    assert_eq!(f.conn.get_post(b.id).unwrap().tag_ids, expected);
}

#[test]
fn add_tag_rejects_unknown_tag_and_post() {
    let f = setup();
    let post = f.conn.create_post(&post_at(&f, "a", 1)).unwrap();

    assert!(matches!(
        f.conn.add_tag(post.id, 31).unwrap_err(),
        ModelError::Validation(ValidationError::MissingTag(31))
    ));
    let t = f.conn.create_tag("t").unwrap();
    assert!(f.conn.add_tag(999, t.id).unwrap_err().is_not_found());
}

#[test]
fn remove_tag_is_idempotent() {
    let f = setup();
    let t = f.conn.create_tag("t").unwrap();
    let mut new = post_at(&f, "a", 1);
    new.tag_ids = BTreeSet::from([t.id]);
    let post = f.conn.create_post(&new).unwrap();

    f.conn.remove_tag(post.id, t.id).unwrap();
    f.conn.remove_tag(post.id, t.id).unwrap();
    assert!(f.conn.get_post(post.id).unwrap().tag_ids.is_empty());
}

#[test]
fn update_changes_only_supplied_fields() {
    let f = setup();
    let t1 = f.conn.create_tag("T1").unwrap();
    let t2 = f.conn.create_tag("T2").unwrap();
    let mut new = post_at(&f, "before", 1);
    new.excerpt = Some("keep me".to_string());
    new.tag_ids = BTreeSet::from([t1.id]);
    let created = f.conn.create_post(&new).unwrap();

    let updated = f
        .conn
        .update_post(
            created.id,
            &PostChanges {
                title: Some("after".to_string()),
                category_id: Some(f.python),
                tag_ids: Some(BTreeSet::from([t2.id])),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "after");
    assert_eq!(updated.body, created.body);
    assert_eq!(updated.excerpt, "keep me");
    assert_eq!(updated.category_id, f.python);
    assert_eq!(updated.tag_ids, BTreeSet::from([t2.id]));
    assert_eq!(updated.created_time, created.created_time);
    assert!(updated.modified_time > created.modified_time);
    assert_eq!(f.conn.get_post(created.id).unwrap(), updated);
}

#[test]
fn update_with_missing_reference_leaves_post_untouched() {
    let f = setup();
    let created = f.conn.create_post(&post_at(&f, "stable", 1)).unwrap();

    let err = f
        .conn
        .update_post(
            created.id,
            &PostChanges {
                title: Some("changed".to_string()),
                author_id: Some(555),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::MissingAuthor(555))
    ));
    assert_eq!(f.conn.get_post(created.id).unwrap(), created);
}

#[test]
fn update_missing_post_is_not_found() {
    let f = setup();
    let err = f
        .conn
        .update_post(8, &PostChanges::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn delete_post_keeps_category_and_tags() {
    let f = setup();
    let t = f.conn.create_tag("t").unwrap();
    let mut new = post_at(&f, "short lived", 1);
    new.tag_ids = BTreeSet::from([t.id]);
    let post = f.conn.create_post(&new).unwrap();

    f.conn.delete_post(post.id).unwrap();

    assert!(f.conn.get_post(post.id).unwrap_err().is_not_found());
    assert!(f.conn.delete_post(post.id).unwrap_err().is_not_found());
    assert_eq!(f.conn.get_tag(t.id).unwrap(), t);
    // The category is free again.
    f.conn.delete_category(f.django).unwrap();
}

#[test]
fn detail_resolves_category_author_and_tags() {
    let f = setup();
    let learn = f.conn.create_tag("Django 学习").unwrap();
    let web = f.conn.create_tag("web").unwrap();
    let mut new = post_at(&f, "title 1", 23);
    new.tag_ids = BTreeSet::from([web.id, learn.id]);
    let post = f.conn.create_post(&new).unwrap();

    let detail = f.conn.get_post_detail(post.id).unwrap();
    assert_eq!(detail.id, post.id);
    assert_eq!(detail.category.name, "Django");
    assert_eq!(detail.author.username, "dreamer");
    let names: Vec<&str> = detail.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Django 学习", "web"]);
}

#[test]
fn detail_listing_matches_post_listing() {
    let f = setup();
    let t = f.conn.create_tag("t").unwrap();
    let mut first = post_at(&f, "first", 1);
    first.tag_ids = BTreeSet::from([t.id]);
    f.conn.create_post(&first).unwrap();
    let mut second = post_at(&f, "second", 2);
    second.category_id = f.python;
    f.conn.create_post(&second).unwrap();

    let posts = f.conn.list_posts().unwrap();
    let details = f.conn.list_post_details().unwrap();

    assert_eq!(details.len(), posts.len());
    for (post, detail) in posts.iter().zip(&details) {
        assert_eq!(post.id, detail.id);
        assert_eq!(post.category_id, detail.category.id);
        assert_eq!(
            post.tag_ids,
            detail.tags.iter().map(|t| t.id).collect::<BTreeSet<_>>()
        );
    }
    assert_eq!(details[0].category.name, "Python");
    assert_eq!(details[1].tags[0].name, "t");
}

#[test]
fn empty_store_lists_nothing() {
    let f = setup();
    assert!(f.conn.list_posts().unwrap().is_empty());
    assert!(f.conn.list_post_details().unwrap().is_empty());
}

#[test]
fn detail_reads_commit_their_own_snapshot() {
    let f = setup();
    let post = f.conn.create_post(&post_at(&f, "snapshot", 1)).unwrap();

    f.conn.get_post_detail(post.id).unwrap();
    f.conn.list_post_details().unwrap();
    assert!(f.conn.is_autocommit(), "read transaction should be closed");
}

#[test]
fn detail_reads_join_an_open_transaction() {
    let f = setup();
    let tx = f.conn.unchecked_transaction().unwrap();
    let post = tx.create_post(&post_at(&f, "uncommitted", 1)).unwrap();

    assert_eq!(tx.get_post_detail(post.id).unwrap().title, "uncommitted");
    assert_eq!(tx.list_post_details().unwrap().len(), 1);
    tx.rollback().unwrap();

    assert!(f.conn.list_post_details().unwrap().is_empty());
}
