//! SQLite implementation of [`PostStore`].

use std::collections::{BTreeSet, HashMap};

use blog_types::{
    validate_body, validate_created_time, validate_excerpt, validate_title, Post, PostDetail,
    Tag, ValidationError,
};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::author::all_authors;
use crate::category::CATEGORIES;
use crate::error::ModelError;
use crate::sql::{decode_time, encode_time, in_transaction, now, row_exists};
use crate::store::{AuthorStore, CategoryStore, PostStore};
use crate::tag::TAGS;

const POST_COLUMNS: &str =
    "id, title, body, created_time, modified_time, excerpt, category_id, author_id";

/// Parameters for creating a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    /// Stored as the empty string when `None`.
    pub excerpt: Option<String>,
    pub category_id: i64,
    pub author_id: i64,
    pub tag_ids: BTreeSet<i64>,
    /// Defaults to the time of insertion. Years must fall within 0000..=9999.
    pub created_time: Option<DateTime<Utc>>,
}

impl NewPost {
    /// A post with no excerpt, no tags and the current creation time.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        category_id: i64,
        author_id: i64,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            excerpt: None,
            category_id,
            author_id,
            tag_ids: BTreeSet::new(),
            created_time: None,
        }
    }
}

/// Parameters for updating an existing post.
///
/// `None` fields are left untouched. `tag_ids: Some(..)` replaces the whole
/// tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub excerpt: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub tag_ids: Option<BTreeSet<i64>>,
}

fn map_row_to_post(row: &Row) -> rusqlite::Result<Post> {
    let created: String = row.get(3)?;
    let modified: String = row.get(4)?;
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created_time: decode_time(3, &created)?,
        modified_time: decode_time(4, &modified)?,
        excerpt: row.get(5)?,
        category_id: row.get(6)?,
        author_id: row.get(7)?,
        tag_ids: BTreeSet::new(),
    })
}

/// Verifies that every supplied reference resolves to an existing record.
fn check_references(
    conn: &Connection,
    category_id: Option<i64>,
    author_id: Option<i64>,
    tag_ids: Option<&BTreeSet<i64>>,
) -> Result<(), ModelError> {
    if let Some(id) = category_id {
        if !row_exists(conn, "categories", id)? {
            return Err(ValidationError::MissingCategory(id).into());
        }
    }
    if let Some(id) = author_id {
        if !row_exists(conn, "users", id)? {
            return Err(ValidationError::MissingAuthor(id).into());
        }
    }
    for &id in tag_ids.into_iter().flatten() {
        if !row_exists(conn, "tags", id)? {
            return Err(ValidationError::MissingTag(id).into());
        }
    }
    Ok(())
}

fn ensure_post(conn: &Connection, id: i64) -> Result<(), ModelError> {
    if row_exists(conn, "posts", id)? {
        Ok(())
    } else {
        Err(ModelError::NotFound { entity: "post", id })
    }
}

fn load_tag_ids(conn: &Connection, post_id: i64) -> Result<BTreeSet<i64>, ModelError> {
    let mut stmt = conn.prepare("SELECT tag_id FROM post_tags WHERE post_id = ?1")?;
    let rows = stmt.query_map([post_id], |row| row.get(0))?;
    let mut ids = BTreeSet::new();
    for row in rows {
        ids.insert(row?);
    }
    Ok(ids)
}

fn load_all_tag_ids(conn: &Connection) -> Result<HashMap<i64, BTreeSet<i64>>, ModelError> {
    let mut stmt = conn.prepare("SELECT post_id, tag_id FROM post_tags")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    let mut by_post: HashMap<i64, BTreeSet<i64>> = HashMap::new();
    for row in rows {
        let (post_id, tag_id) = row?;
        by_post.entry(post_id).or_default().insert(tag_id);
    }
    Ok(by_post)
}

fn replace_tags(
    conn: &Connection,
    post_id: i64,
    tag_ids: &BTreeSet<i64>,
) -> Result<(), ModelError> {
    conn.execute("DELETE FROM post_tags WHERE post_id = ?1", [post_id])?;
    let mut stmt = conn.prepare("INSERT INTO post_tags (post_id, tag_id) VALUES (?1, ?2)")?;
    for tag_id in tag_ids {
        stmt.execute(params![post_id, tag_id])?;
    }
    Ok(())
}

fn load_post(conn: &Connection, id: i64) -> Result<Post, ModelError> {
    let mut post = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            [id],
            map_row_to_post,
        )
        .optional()?
        .ok_or(ModelError::NotFound { entity: "post", id })?;
    post.tag_ids = load_tag_ids(conn, id)?;
    Ok(post)
}

/// Resolves the tags of one post.
fn load_tags(conn: &Connection, post_id: i64) -> Result<Vec<Tag>, ModelError> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name
         FROM tags t JOIN post_tags pt ON pt.tag_id = t.id
         WHERE pt.post_id = ?1",
    )?;
    let rows = stmt.query_map([post_id], |row| {
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

impl PostStore for Connection {
    fn create_post(&self, new: &NewPost) -> Result<Post, ModelError> {
        let title = validate_title(&new.title)?;
        validate_body(&new.body)?;
        let excerpt = validate_excerpt(new.excerpt.as_deref())?;
        let created = match new.created_time {
            Some(at) => validate_created_time(at)?.trunc_subsecs(6),
            None => now(),
        };
        let created = encode_time(&created);

        let post = in_transaction(self, |conn| {
            check_references(
                conn,
                Some(new.category_id),
                Some(new.author_id),
                Some(&new.tag_ids),
            )?;

            conn.execute(
                "INSERT INTO posts (
                    title, body, created_time, modified_time, excerpt, category_id, author_id
                ) VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6)",
                params![
                    title,
                    new.body,
                    created,
                    excerpt,
                    new.category_id,
                    new.author_id
                ],
            )?;
            let id = conn.last_insert_rowid();
            replace_tags(conn, id, &new.tag_ids)?;
            load_post(conn, id)
        })?;

        tracing::info!(post_id = post.id, title = %post.title, "created post");
        Ok(post)
    }

    fn get_post(&self, id: i64) -> Result<Post, ModelError> {
        load_post(self, id)
    }

    fn list_posts(&self) -> Result<Vec<Post>, ModelError> {
        let mut stmt = self.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_time DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], map_row_to_post)?;
        let mut tags = load_all_tag_ids(self)?;

        let mut posts = Vec::new();
        for row in rows {
            let mut post = row?;
            post.tag_ids = tags.remove(&post.id).unwrap_or_default();
            posts.push(post);
        }
        Ok(posts)
    }

    /// Builds a single UPDATE from the supplied fields. `modified_time` is
    /// stamped even when nothing else changes.
    fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Post, ModelError> {
        let title = changes.title.as_deref().map(validate_title).transpose()?;
        if let Some(body) = &changes.body {
            validate_body(body)?;
        }
        let excerpt = changes
            .excerpt
            .as_deref()
            .map(|e| validate_excerpt(Some(e)))
            .transpose()?;

        in_transaction(self, |conn| {
            ensure_post(conn, id)?;
            check_references(
                conn,
                changes.category_id,
                changes.author_id,
                changes.tag_ids.as_ref(),
            )?;

            let mut set_parts: Vec<String> = Vec::new();
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(title) = title {
                values.push(Box::new(title.to_string()));
                set_parts.push(format!("title = ?{}", values.len()));
            }
            if let Some(body) = &changes.body {
                values.push(Box::new(body.clone()));
                set_parts.push(format!("body = ?{}", values.len()));
            }
            if let Some(excerpt) = &excerpt {
                values.push(Box::new(excerpt.clone()));
                set_parts.push(format!("excerpt = ?{}", values.len()));
            }
            if let Some(category_id) = changes.category_id {
                values.push(Box::new(category_id));
                set_parts.push(format!("category_id = ?{}", values.len()));
            }
            if let Some(author_id) = changes.author_id {
                values.push(Box::new(author_id));
                set_parts.push(format!("author_id = ?{}", values.len()));
            }
            values.push(Box::new(encode_time(&now())));
            set_parts.push(format!("modified_time = ?{}", values.len()));

            values.push(Box::new(id));
            let sql = format!(
                "UPDATE posts SET {} WHERE id = ?{}",
                set_parts.join(", "),
                values.len()
            );
            let params: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(|v| v.as_ref()).collect();
            conn.execute(&sql, params.as_slice())?;

            if let Some(tag_ids) = &changes.tag_ids {
                replace_tags(conn, id, tag_ids)?;
            }
            load_post(conn, id)
        })
    }

    fn delete_post(&self, id: i64) -> Result<(), ModelError> {
        in_transaction(self, |conn| {
            conn.execute("DELETE FROM post_tags WHERE post_id = ?1", [id])?;
            let count = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            if count == 0 {
                return Err(ModelError::NotFound { entity: "post", id });
            }
            Ok(())
        })?;
        tracing::info!(post_id = id, "deleted post");
        Ok(())
    }

    fn add_tag(&self, post_id: i64, tag_id: i64) -> Result<(), ModelError> {
        ensure_post(self, post_id)?;
        if !row_exists(self, "tags", tag_id)? {
            return Err(ValidationError::MissingTag(tag_id).into());
        }
        self.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
            params![post_id, tag_id],
        )?;
        Ok(())
    }

    fn remove_tag(&self, post_id: i64, tag_id: i64) -> Result<(), ModelError> {
        ensure_post(self, post_id)?;
        self.execute(
            "DELETE FROM post_tags WHERE post_id = ?1 AND tag_id = ?2",
            params![post_id, tag_id],
        )?;
        Ok(())
    }

    /// Reads the post and its relations in one transaction so they come from
    /// the same snapshot.
    fn get_post_detail(&self, id: i64) -> Result<PostDetail, ModelError> {
        in_transaction(self, |conn| {
            let post = load_post(conn, id)?;
            let category = conn.get_category(post.category_id)?;
            let author = conn.get_author(post.author_id)?;
            let tags = load_tags(conn, id)?;
            Ok(PostDetail::from_parts(post, category, author, tags))
        })
    }

    fn list_post_details(&self) -> Result<Vec<PostDetail>, ModelError> {
        in_transaction(self, resolve_post_details)
    }
}

/// Resolves every post against bulk category, author and tag maps.
fn resolve_post_details(conn: &Connection) -> Result<Vec<PostDetail>, ModelError> {
    let posts = conn.list_posts()?;
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let categories: HashMap<i64, _> = CATEGORIES
        .list(conn)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let authors: HashMap<i64, _> = all_authors(conn)?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let tags: HashMap<i64, _> = TAGS.list(conn)?.into_iter().map(|t| (t.id, t)).collect();

    let mut details = Vec::with_capacity(posts.len());
    for post in posts {
        let category = categories
            .get(&post.category_id)
            .cloned()
            .ok_or(ModelError::NotFound {
                entity: "category",
                id: post.category_id,
            })?;
        let author = authors
            .get(&post.author_id)
            .cloned()
            .ok_or(ModelError::NotFound {
                entity: "author",
                id: post.author_id,
            })?;
        let post_tags = post
            .tag_ids
            .iter()
            .filter_map(|id| tags.get(id).cloned())
            .collect();
        details.push(PostDetail::from_parts(post, category, author, post_tags));
    }
    Ok(details)
}
