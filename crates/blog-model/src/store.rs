//! Store traits: the data-access interface for each entity.
//!
//! The traits say nothing about SQL; the SQLite implementations live next to
//! each entity (`impl CategoryStore for Connection` in `category.rs`, and so
//! on).

use blog_types::{Author, Category, Post, PostDetail, Tag};

use crate::error::ModelError;
use crate::post::{NewPost, PostChanges};

/// Access to author identities.
pub trait AuthorStore {
    /// Registers an author. Usernames are unique.
    fn create_author(&self, username: &str) -> Result<Author, ModelError>;

    /// Fetches an author by id.
    fn get_author(&self, id: i64) -> Result<Author, ModelError>;

    /// Looks up an author by exact username.
    fn find_author_by_username(&self, username: &str) -> Result<Option<Author>, ModelError>;
}

/// CRUD for categories.
pub trait CategoryStore {
    fn create_category(&self, name: &str) -> Result<Category, ModelError>;

    fn get_category(&self, id: i64) -> Result<Category, ModelError>;

    /// Looks up a category by name, ignoring case.
    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, ModelError>;

    /// All categories ordered by name.
    fn list_categories(&self) -> Result<Vec<Category>, ModelError>;

    fn update_category(&self, id: i64, name: &str) -> Result<Category, ModelError>;

    /// Deletes a category.
    ///
    /// Fails with [`ModelError::InUse`] while any post references it.
    fn delete_category(&self, id: i64) -> Result<(), ModelError>;
}

/// CRUD for tags.
pub trait TagStore {
    fn create_tag(&self, name: &str) -> Result<Tag, ModelError>;

    fn get_tag(&self, id: i64) -> Result<Tag, ModelError>;

    /// Looks up a tag by name, ignoring case.
    fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, ModelError>;

    /// All tags ordered by name.
    fn list_tags(&self) -> Result<Vec<Tag>, ModelError>;

    fn update_tag(&self, id: i64, name: &str) -> Result<Tag, ModelError>;

    /// Deletes a tag and detaches it from every post.
    fn delete_tag(&self, id: i64) -> Result<(), ModelError>;
}

/// CRUD and relationship management for posts.
pub trait PostStore {
    /// Creates a post with its tag set.
    ///
    /// The category, author and every tag must exist, otherwise nothing is
    /// written and a [`ModelError::Validation`] is returned.
    fn create_post(&self, new: &NewPost) -> Result<Post, ModelError>;

    fn get_post(&self, id: i64) -> Result<Post, ModelError>;

    /// All posts, newest first.
    fn list_posts(&self) -> Result<Vec<Post>, ModelError>;

    /// Applies the `Some` fields of `changes` and stamps `modified_time`.
    fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Post, ModelError>;

    fn delete_post(&self, id: i64) -> Result<(), ModelError>;

    /// Attaches a tag. Attaching an already attached tag is a no-op.
    fn add_tag(&self, post_id: i64, tag_id: i64) -> Result<(), ModelError>;

    /// Detaches a tag. Detaching an absent tag is a no-op.
    fn remove_tag(&self, post_id: i64, tag_id: i64) -> Result<(), ModelError>;

    /// Fetches a post with its category, author and tags resolved.
    fn get_post_detail(&self, id: i64) -> Result<PostDetail, ModelError>;

    /// [`PostStore::list_posts`] with references resolved.
    fn list_post_details(&self) -> Result<Vec<PostDetail>, ModelError>;
}
