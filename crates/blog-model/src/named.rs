//! Shared persistence for the single-name lookup tables (categories, tags).

use blog_types::validate_name;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ModelError;
use crate::sql::is_unique_violation;

/// Describes a `(id, name)` table and how to build its record type.
pub(crate) struct NamedTable<T> {
    pub table: &'static str,
    pub entity: &'static str,
    pub build: fn(i64, String) -> T,
}

impl<T> NamedTable<T> {
    fn conflict(&self, name: &str, err: rusqlite::Error) -> ModelError {
        if is_unique_violation(&err) {
            ModelError::DuplicateName {
                entity: self.entity,
                name: name.to_string(),
            }
        } else {
            ModelError::Database(err)
        }
    }

    pub(crate) fn insert(&self, conn: &Connection, name: &str) -> Result<T, ModelError> {
        let name = validate_name(self.entity, name)?;
        conn.execute(
            &format!("INSERT INTO {} (name) VALUES (?1)", self.table),
            [name],
        )
        .map_err(|e| self.conflict(name, e))?;

        let id = conn.last_insert_rowid();
        tracing::info!(entity = self.entity, id, name, "created record");
        Ok((self.build)(id, name.to_string()))
    }

    pub(crate) fn get(&self, conn: &Connection, id: i64) -> Result<T, ModelError> {
        conn.query_row(
            &format!("SELECT id, name FROM {} WHERE id = ?1", self.table),
            [id],
            |row| Ok((self.build)(row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(ModelError::NotFound {
            entity: self.entity,
            id,
        })
    }

    /// The `name` column is declared `COLLATE NOCASE`, so `=` ignores case.
    pub(crate) fn find(&self, conn: &Connection, name: &str) -> Result<Option<T>, ModelError> {
        let found = conn
            .query_row(
                &format!("SELECT id, name FROM {} WHERE name = ?1", self.table),
                [name.trim()],
                |row| Ok((self.build)(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(found)
    }

    pub(crate) fn list(&self, conn: &Connection) -> Result<Vec<T>, ModelError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name FROM {} ORDER BY name ASC, id ASC",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| Ok((self.build)(row.get(0)?, row.get(1)?)))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub(crate) fn rename(&self, conn: &Connection, id: i64, name: &str) -> Result<T, ModelError> {
        let name = validate_name(self.entity, name)?;
        let count = conn
            .execute(
                &format!("UPDATE {} SET name = ?1 WHERE id = ?2", self.table),
                params![name, id],
            )
            .map_err(|e| self.conflict(name, e))?;
        if count == 0 {
            return Err(ModelError::NotFound {
                entity: self.entity,
                id,
            });
        }
        Ok((self.build)(id, name.to_string()))
    }

    pub(crate) fn remove(&self, conn: &Connection, id: i64) -> Result<(), ModelError> {
        let count = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", self.table), [id])?;
        if count == 0 {
            return Err(ModelError::NotFound {
                entity: self.entity,
                id,
            });
        }
        tracing::info!(entity = self.entity, id, "deleted record");
        Ok(())
    }
}
