//! Error types for the data-access layer.

use blog_types::ValidationError;
use thiserror::Error;

/// Errors returned by the store traits.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The write was refused before touching storage.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No record with the given identifier exists.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: i64,
    },

    /// The record is still referenced by posts and cannot be deleted.
    #[error("{entity} {id} is still used by {posts} post(s)")]
    InUse {
        /// The kind of record.
        entity: &'static str,
        /// The record identifier.
        id: i64,
        /// How many posts reference it.
        posts: i64,
    },

    /// Another record already carries this name.
    #[error("{entity} already exists: {name}")]
    DuplicateName {
        /// The kind of record.
        entity: &'static str,
        /// The conflicting name.
        name: String,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ModelError {
    /// Returns `true` for [`ModelError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
