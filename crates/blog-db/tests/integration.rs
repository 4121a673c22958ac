use blog_db::{create_pool, run_migrations, DbRuntimeSettings};

fn tables(conn: &rusqlite::Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .expect("failed to prepare table query");
    stmt.query_map([], |row| row.get(0))
        .expect("failed to execute table query")
        .map(|r| r.expect("failed to read table name"))
        .collect()
}

#[test]
fn file_backed_pool_shares_schema_across_connections() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("blog.db");
    let pool = create_pool(
        path.to_str().expect("temp path should be utf-8"),
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");

    {
        let conn = pool.get().expect("failed to get connection");
        let applied = run_migrations(&conn).expect("failed to run migrations");
        assert_eq!(applied, 5);

        let mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("failed to query journal mode");
        assert_eq!(mode, "wal");
    }

    // A second checkout sees the same schema.
    let a = pool.get().expect("failed to get first connection");
    let b = pool.get().expect("failed to get second connection");
    assert_eq!(tables(&a), tables(&b));
    assert_eq!(
        tables(&a),
        vec![
            "_blog_migrations",
            "categories",
            "post_tags",
            "posts",
            "tags",
            "users"
        ]
    );
}

#[test]
fn foreign_keys_reject_dangling_post_references() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("blog.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    run_migrations(&conn).expect("failed to run migrations");

    let err = conn
        .execute(
            "INSERT INTO posts (title, body, created_time, modified_time, category_id, author_id)
             VALUES ('t', 'b', '2016-12-23T00:00:00.000000Z', '2016-12-23T00:00:00.000000Z', 7, 7)",
            [],
        )
        .expect_err("dangling references should be rejected");
    assert_eq!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    );
}

#[test]
fn reopening_database_applies_nothing_new() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("blog.db");
    let path = path.to_str().unwrap();

    {
        let pool = create_pool(path, DbRuntimeSettings::default()).unwrap();
        let conn = pool.get().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 5);
    }

    let pool = create_pool(path, DbRuntimeSettings::default()).unwrap();
    let conn = pool.get().unwrap();
    assert_eq!(run_migrations(&conn).unwrap(), 0);
}
