//! SQLite implementation of [`AuthorStore`].

use blog_types::{validate_username, Author};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::ModelError;
use crate::sql::is_unique_violation;
use crate::store::AuthorStore;

fn map_row_to_author(row: &Row) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        username: row.get(1)?,
    })
}

/// Every author, for bulk resolution of post listings.
pub(crate) fn all_authors(conn: &Connection) -> Result<Vec<Author>, ModelError> {
    let mut stmt = conn.prepare("SELECT id, username FROM users ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_row_to_author)?;
    let mut authors = Vec::new();
    for row in rows {
        authors.push(row?);
    }
    Ok(authors)
}

impl AuthorStore for Connection {
    fn create_author(&self, username: &str) -> Result<Author, ModelError> {
        let username = validate_username(username)?;
        self.execute("INSERT INTO users (username) VALUES (?1)", [username])
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ModelError::DuplicateName {
                        entity: "author",
                        name: username.to_string(),
                    }
                } else {
                    ModelError::Database(e)
                }
            })?;

        let id = self.last_insert_rowid();
        tracing::info!(author_id = id, username, "registered author");
        Ok(Author {
            id,
            username: username.to_string(),
        })
    }

    fn get_author(&self, id: i64) -> Result<Author, ModelError> {
        self.query_row(
            "SELECT id, username FROM users WHERE id = ?1",
            [id],
            map_row_to_author,
        )
        .optional()?
        .ok_or(ModelError::NotFound {
            entity: "author",
            id,
        })
    }

    fn find_author_by_username(&self, username: &str) -> Result<Option<Author>, ModelError> {
        let author = self
            .query_row(
                "SELECT id, username FROM users WHERE username = ?1",
                [username.trim()],
                map_row_to_author,
            )
            .optional()?;
        Ok(author)
    }
}
