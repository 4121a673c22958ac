//! Shared entity types and validation rules for the blog.
//!
//! This crate defines the records every other crate passes around:
//! [`Category`], [`Tag`], [`Author`], [`Post`] and the resolved
//! [`PostDetail`] view. It performs no I/O. Relationships are held as
//! identifiers (`category_id`, `author_id`, `tag_ids`) and resolved by the
//! data-access layer on demand.

mod validation;

pub use validation::{
    validate_body, validate_created_time, validate_excerpt, validate_name, validate_title,
    validate_username, ValidationError, MAX_EXCERPT_LEN, MAX_NAME_LEN, MAX_TITLE_LEN,
    MAX_USERNAME_LEN,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single-valued classification attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Database-assigned identifier.
    pub id: i64,
    /// Display name, unique case-insensitively.
    pub name: String,
}

/// A multi-valued label attached to posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Database-assigned identifier.
    pub id: i64,
    /// Display name, unique case-insensitively.
    pub name: String,
}

/// The user identity that wrote a post.
///
/// Identities belong to the surrounding platform. The blog keeps only the
/// minimal record posts point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Database-assigned identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
}

/// A blog article as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Database-assigned identifier.
    pub id: i64,
    /// Headline, at most [`MAX_TITLE_LEN`] characters.
    pub title: String,
    /// Article text.
    pub body: String,
    /// When the post was written.
    pub created_time: DateTime<Utc>,
    /// When the post was last changed.
    pub modified_time: DateTime<Utc>,
    /// Short summary; empty when the post has none.
    pub excerpt: String,
    /// The owning category.
    pub category_id: i64,
    /// The writing author.
    pub author_id: i64,
    /// Attached tags.
    pub tag_ids: BTreeSet<i64>,
}

/// A post with its category, author and tags resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub excerpt: String,
    pub category: Category,
    pub author: Author,
    /// Tags sorted by name.
    pub tags: Vec<Tag>,
}

impl PostDetail {
    /// Assembles a detail view from a stored post and its resolved references.
    ///
    /// Tags are sorted by name so the view is stable regardless of the
    /// order the caller resolved them in.
    pub fn from_parts(post: Post, category: Category, author: Author, mut tags: Vec<Tag>) -> Self {
        tags.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Self {
            id: post.id,
            title: post.title,
            body: post.body,
            created_time: post.created_time,
            modified_time: post.modified_time,
            excerpt: post.excerpt,
            category,
            author,
            tags,
        }
    }
}
