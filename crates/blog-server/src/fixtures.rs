//! Seed content loaded from a TOML fixtures file at startup.
//!
//! ```toml
//! [[authors]]
//! username = "dreamer"
//!
//! [[categories]]
//! name = "Django"
//!
//! [[tags]]
//! name = "Django 学习"
//!
//! [[posts]]
//! title = "title 1"
//! body = "text 1"
//! category = "Django"
//! author = "dreamer"
//! tags = ["Django 学习"]
//! created_time = "2016-12-23T00:00:00Z"
//! ```
//!
//! Authors, categories and tags are created only when missing. Posts are
//! inserted only into a store that holds no posts yet, so loading the same
//! file on every start is harmless. The whole file applies in one
//! transaction.

use blog_model::{AuthorStore, CategoryStore, ModelError, NewPost, PostStore, TagStore};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Parsed fixtures file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub authors: Vec<AuthorFixture>,
    #[serde(default)]
    pub categories: Vec<NameFixture>,
    #[serde(default)]
    pub tags: Vec<NameFixture>,
    #[serde(default)]
    pub posts: Vec<PostFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorFixture {
    pub username: String,
}

/// A category or tag entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NameFixture {
    pub name: String,
}

/// A post entry. References are by name.
#[derive(Debug, Clone, Deserialize)]
pub struct PostFixture {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub category: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// RFC 3339 string; defaults to load time.
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// What a fixtures run created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureReport {
    pub authors: usize,
    pub categories: usize,
    pub tags: usize,
    pub posts: usize,
}

/// Errors that can occur while loading fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixtures file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse fixtures file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A post names a category, author or tag that does not exist.
    #[error("post '{title}' references unknown {kind} '{name}'")]
    UnknownReference {
        title: String,
        kind: &'static str,
        name: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Parses fixtures from TOML text.
pub fn parse_fixtures(contents: &str) -> Result<Fixtures, FixtureError> {
    Ok(toml::from_str(contents)?)
}

/// Reads, parses and applies a fixtures file.
///
/// # Errors
///
/// Returns `FixtureError` if the file cannot be read or parsed, or if any
/// record is rejected by the store. Nothing is written in that case.
pub fn load_fixtures_file(conn: &Connection, path: &str) -> Result<FixtureReport, FixtureError> {
    let contents = std::fs::read_to_string(path)?;
    let fixtures = parse_fixtures(&contents)?;
    apply_fixtures(conn, &fixtures)
}

/// Applies parsed fixtures in a single transaction.
pub fn apply_fixtures(
    conn: &Connection,
    fixtures: &Fixtures,
) -> Result<FixtureReport, FixtureError> {
    let tx = conn.unchecked_transaction().map_err(ModelError::from)?;
    let mut report = FixtureReport::default();

    for author in &fixtures.authors {
        if tx.find_author_by_username(&author.username)?.is_none() {
            tx.create_author(&author.username)?;
            report.authors += 1;
        }
    }
    for category in &fixtures.categories {
        if tx.find_category_by_name(&category.name)?.is_none() {
            tx.create_category(&category.name)?;
            report.categories += 1;
        }
    }
    for tag in &fixtures.tags {
        if tx.find_tag_by_name(&tag.name)?.is_none() {
            tx.create_tag(&tag.name)?;
            report.tags += 1;
        }
    }

    if !fixtures.posts.is_empty() && tx.list_posts()?.is_empty() {
        for post in &fixtures.posts {
            let new = resolve_post(&tx, post)?;
            tx.create_post(&new)?;
            report.posts += 1;
        }
    } else if !fixtures.posts.is_empty() {
        tracing::debug!("store already holds posts, skipping fixture posts");
    }

    tx.commit().map_err(ModelError::from)?;
    Ok(report)
}

fn resolve_post(conn: &Connection, post: &PostFixture) -> Result<NewPost, FixtureError> {
    let unknown = |kind: &'static str, name: &str| FixtureError::UnknownReference {
        title: post.title.clone(),
        kind,
        name: name.to_string(),
    };

    let category = conn
        .find_category_by_name(&post.category)?
        .ok_or_else(|| unknown("category", &post.category))?;
    let author = conn
        .find_author_by_username(&post.author)?
        .ok_or_else(|| unknown("author", &post.author))?;
    let mut tag_ids = BTreeSet::new();
    for name in &post.tags {
        let tag = conn
            .find_tag_by_name(name)?
            .ok_or_else(|| unknown("tag", name))?;
        tag_ids.insert(tag.id);
    }

    Ok(NewPost {
        title: post.title.clone(),
        body: post.body.clone(),
        excerpt: post.excerpt.clone(),
        category_id: category.id,
        author_id: author.id,
        tag_ids,
        created_time: post.created_time,
    })
}
