//! SQLite implementation of the key/value capability.

use async_trait::async_trait;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use super::kv::KvStore;
use crate::Error;

#[async_trait]
impl KvStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM entries WHERE key = ?1")?;

                match stmt.query_row(params![key], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn get_all(&self) -> Result<Vec<(String, String)>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare("SELECT key, value FROM entries")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Upsert each entry independently; a failure leaves earlier writes in place.
    async fn set(&self, entries: Vec<(String, String)>) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let mut stmt = conn.prepare(
                    "INSERT INTO entries (key, value) VALUES (?1, ?2)
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                )?;
                for (key, value) in &entries {
                    stmt.execute(params![key, value])?;
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn remove(&self, keys: Vec<String>) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let mut stmt = conn.prepare("DELETE FROM entries WHERE key = ?1")?;
                let mut count = 0u64;
                for key in &keys {
                    count += stmt.execute(params![key])? as u64;
                }
                Ok(count)
            })
            .await
            .map_err(Error::from)
    }

    async fn bytes_in_use(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let bytes: i64 = conn.query_row(
                    "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0) FROM entries",
                    [],
                    |row| row.get(0),
                )?;
                Ok(bytes as u64)
            })
            .await
            .map_err(Error::from)
    }
}
