//! Data-access layer for the blog.
//!
//! Every operation goes through one of the store traits ([`AuthorStore`],
//! [`CategoryStore`], [`TagStore`], [`PostStore`]), which are implemented for
//! [`rusqlite::Connection`]. The connection is the storage handle: callers
//! pass a pooled connection or an open transaction explicitly, there is no
//! process-wide "current database".
//!
//! # Integrity rules
//!
//! | Operation | Rule |
//! |-----------|------|
//! | create/update post | category, author and every tag must exist |
//! | delete category | rejected with [`ModelError::InUse`] while posts reference it |
//! | delete tag | removes the tag from every post; posts survive |
//! | delete post | removes its tag links; category, author and tags survive |
//! | create/rename category or tag | names are unique, ignoring case |
//!
//! Posts list newest first (`created_time` descending, then `id`
//! descending). Categories and tags list by name.
//!
//! ```rust,ignore
//! use blog_model::{CategoryStore, NewPost, PostStore};
//!
//! let django = conn.create_category("Django")?;
//! let post = conn.create_post(&NewPost::new("title", "body", django.id, author.id))?;
//! let detail = conn.get_post_detail(post.id)?;
//! ```

mod author;
mod category;
mod error;
mod named;
mod post;
mod sql;
mod store;
mod tag;

pub use error::ModelError;
pub use post::{NewPost, PostChanges};
pub use store::{AuthorStore, CategoryStore, PostStore, TagStore};
