//! Cached entry CRUD and cache-name bookkeeping.
//!
//! Entries are keyed by `(cache_name, request_key)`. Writes use UPSERT
//! semantics, so concurrent fetch handlers racing on the same key resolve
//! to last-write-wins, which is acceptable for an availability cache.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// An opaque response snapshot stored under a versioned cache name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub request_key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedEntry {
    /// Build an entry from response parts, deriving the request key.
    pub fn from_response(
        method: &str,
        url: &str,
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            request_key: compute_request_key(method, url),
            method: method.to_uppercase(),
            url: url.to_string(),
            status,
            headers,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl CacheDb {
    /// Insert or overwrite an entry under the given cache name.
    pub async fn put_entry(&self, cache_name: &str, entry: &CachedEntry) -> Result<(), Error> {
        let cache_name = cache_name.to_string();
        let entry = entry.clone();
        let headers_json = serde_json::to_string(&entry.headers)
            .map_err(|e| Error::InvalidInput(format!("unencodable headers: {e}")))?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        cache_name, request_key, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(cache_name, request_key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &cache_name,
                        &entry.request_key,
                        &entry.method,
                        &entry.url,
                        entry.status as i64,
                        &headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry by exact request identity.
    ///
    /// Returns None on a cache miss.
    pub async fn get_entry(&self, cache_name: &str, method: &str, url: &str) -> Result<Option<CachedEntry>, Error> {
        let cache_name = cache_name.to_string();
        let request_key = compute_request_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT request_key, method, url, status, headers_json, body, stored_at
                     FROM entries WHERE cache_name = ?1 AND request_key = ?2",
                )?;

                let result = stmt.query_row(params![cache_name, request_key], |row| {
                    let headers_json: String = row.get(4)?;
                    Ok((
                        CachedEntry {
                            request_key: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status: row.get::<_, i64>(3)? as u16,
                            headers: Vec::new(),
                            body: row.get(5)?,
                            stored_at: row.get(6)?,
                        },
                        headers_json,
                    ))
                });

                match result {
                    Ok((mut entry, headers_json)) => {
                        entry.headers = serde_json::from_str(&headers_json).unwrap_or_default();
                        Ok(Some(entry))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List every distinct cache name present in the store.
    pub async fn list_cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT cache_name FROM entries ORDER BY cache_name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry under a cache name.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_entries(&self, cache_name: &str) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM entries WHERE cache_name = ?1", params![cache_name])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries under a cache name.
    pub async fn count_entries(&self, cache_name: &str) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE cache_name = ?1",
                    params![cache_name],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// The cache name currently activated for a namespace, if any.
    pub async fn controller(&self, namespace: &str) -> Result<Option<String>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT cache_name FROM controllers WHERE namespace = ?1",
                    params![namespace],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(name) => Ok(Some(name)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Record the activated cache name for a namespace.
    ///
    /// Only activation calls this; it is the single durable pointer to the
    /// current version.
    pub async fn set_controller(&self, namespace: &str, cache_name: &str) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO controllers (namespace, cache_name, activated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(namespace) DO UPDATE SET
                        cache_name = excluded.cache_name,
                        activated_at = excluded.activated_at",
                    params![namespace, cache_name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
