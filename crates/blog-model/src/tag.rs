//! SQLite implementation of [`TagStore`].

use blog_types::Tag;
use rusqlite::Connection;

use crate::error::ModelError;
use crate::named::NamedTable;
use crate::sql::in_transaction;
use crate::store::TagStore;

fn build(id: i64, name: String) -> Tag {
    Tag { id, name }
}

pub(crate) const TAGS: NamedTable<Tag> = NamedTable {
    table: "tags",
    entity: "tag",
    build,
};

impl TagStore for Connection {
    fn create_tag(&self, name: &str) -> Result<Tag, ModelError> {
        TAGS.insert(self, name)
    }

    fn get_tag(&self, id: i64) -> Result<Tag, ModelError> {
        TAGS.get(self, id)
    }

    fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, ModelError> {
        TAGS.find(self, name)
    }

    fn list_tags(&self) -> Result<Vec<Tag>, ModelError> {
        TAGS.list(self)
    }

    fn update_tag(&self, id: i64, name: &str) -> Result<Tag, ModelError> {
        TAGS.rename(self, id, name)
    }

    fn delete_tag(&self, id: i64) -> Result<(), ModelError> {
        // Links are removed explicitly so the cascade holds even on
        // connections opened without `PRAGMA foreign_keys`.
        in_transaction(self, |conn| {
            let detached = conn.execute("DELETE FROM post_tags WHERE tag_id = ?1", [id])?;
            TAGS.remove(conn, id)?;
            if detached > 0 {
                tracing::debug!(tag_id = id, posts = detached, "detached deleted tag");
            }
            Ok(())
        })
    }
}
