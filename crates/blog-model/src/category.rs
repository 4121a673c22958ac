//! SQLite implementation of [`CategoryStore`].

use blog_types::Category;
use rusqlite::Connection;

use crate::error::ModelError;
use crate::named::NamedTable;
use crate::sql::in_transaction;
use crate::store::CategoryStore;

fn build(id: i64, name: String) -> Category {
    Category { id, name }
}

pub(crate) const CATEGORIES: NamedTable<Category> = NamedTable {
    table: "categories",
    entity: "category",
    build,
};

impl CategoryStore for Connection {
    fn create_category(&self, name: &str) -> Result<Category, ModelError> {
        CATEGORIES.insert(self, name)
    }

    fn get_category(&self, id: i64) -> Result<Category, ModelError> {
        CATEGORIES.get(self, id)
    }

    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, ModelError> {
        CATEGORIES.find(self, name)
    }

    fn list_categories(&self) -> Result<Vec<Category>, ModelError> {
        CATEGORIES.list(self)
    }

    fn update_category(&self, id: i64, name: &str) -> Result<Category, ModelError> {
        CATEGORIES.rename(self, id, name)
    }

    fn delete_category(&self, id: i64) -> Result<(), ModelError> {
        in_transaction(self, |conn| {
            let posts: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE category_id = ?1",
                [id],
                |row| row.get(0),
            )?;
            if posts > 0 {
                return Err(ModelError::InUse {
                    entity: CATEGORIES.entity,
                    id,
                    posts,
                });
            }
            CATEGORIES.remove(conn, id)
        })
    }
}
