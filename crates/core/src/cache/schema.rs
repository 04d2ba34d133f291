//! Cache table layout, versioned through `PRAGMA user_version`.

use tokio_rusqlite::Connection;

use super::Error;

/// Layout version stamped on a prepared database.
pub(crate) const SCHEMA_VERSION: i64 = 1;

const ENTRIES_TABLE: &str = include_str!("../../sql/entries.sql");

/// Bring an opened database up to [`SCHEMA_VERSION`].
///
/// A database stamped with a newer version is refused.
pub(crate) async fn ensure(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if found > SCHEMA_VERSION {
            return Err(Error::SchemaVersion(format!(
                "cache schema v{found} is newer than supported v{SCHEMA_VERSION}"
            )));
        }
        if found < SCHEMA_VERSION {
            tracing::debug!(from = found, to = SCHEMA_VERSION, "creating cache schema");
            let tx = conn.transaction()?;
            tx.execute_batch(ENTRIES_TABLE)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
        }
        Ok(())
    })
    .await
    .map_err(Error::from)
}
