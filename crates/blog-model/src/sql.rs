//! SQLite helpers shared by the stores.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;

use crate::error::ModelError;

/// Runs `f` inside a transaction unless the connection is already in one.
///
/// Nested calls (for example a store call made while loading fixtures inside
/// an outer transaction) join the caller's transaction instead of failing.
pub(crate) fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, ModelError>,
) -> Result<T, ModelError> {
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = conn.unchecked_transaction()?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

/// Checks whether a row with `id` exists in `table`.
pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool, ModelError> {
    let exists = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Returns `true` if `err` is a UNIQUE constraint failure.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// The current time at storage precision.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Encodes a timestamp as fixed-width RFC 3339 text.
pub(crate) fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decodes a timestamp column, reporting failures against `idx`.
pub(crate) fn decode_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encoded_times_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2016, 12, 23, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2016, 12, 23, 10, 0, 0).unwrap();
        assert_eq!(encode_time(&earlier), "2016-12-23T09:00:00.000000Z");
        assert!(encode_time(&earlier) < encode_time(&later));
    }

    #[test]
    fn decode_reverses_encode() {
        let at = now();
        assert_eq!(decode_time(0, &encode_time(&at)).unwrap(), at);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_time(3, "yesterday"),
            Err(rusqlite::Error::FromSqlConversionFailure(3, Type::Text, _))
        ));
    }
}
