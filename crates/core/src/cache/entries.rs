//! Namespace and entry operations on the SQLite cache.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::{CacheStorage, ResponseSnapshot};
use crate::{Error, RequestKey};

/// Row form of an entry, ready to be written.
struct EntryRow {
    key: String,
    method: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(key: &RequestKey, response: &ResponseSnapshot) -> Result<Self, Error> {
        if !key.is_get() {
            return Err(Error::UnsupportedMethod(key.method.clone()));
        }
        Ok(Self {
            key: key.hash(),
            method: key.method.clone(),
            url: key.url.clone(),
            status: i64::from(response.status),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

fn ensure_namespace(conn: &rusqlite::Connection, namespace: &str, now: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
        params![namespace, now],
    )?;
    let id = conn.query_row("SELECT id FROM namespaces WHERE name = ?1", params![namespace], |row| row.get(0))?;
    Ok(id)
}

fn upsert_entry(conn: &rusqlite::Connection, namespace_id: i64, row: &EntryRow, now: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (namespace_id, key, method, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(namespace_id, key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![namespace_id, &row.key, &row.method, &row.url, row.status, &row.headers_json, &row.body, now],
    )?;
    Ok(())
}

impl CacheDb {
    /// Number of entries stored in a namespace (0 if it doesn't exist).
    pub async fn count_entries(&self, namespace: &str) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries e JOIN namespaces n ON n.id = e.namespace_id WHERE n.name = ?1",
                    params![namespace],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_namespace(conn, &namespace, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, namespace: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.put_all(namespace, vec![(key.clone(), response.clone())]).await
    }

    async fn put_all(&self, namespace: &str, entries: Vec<(RequestKey, ResponseSnapshot)>) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(key, response)| EntryRow::encode(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let namespace = namespace.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let namespace_id = ensure_namespace(&tx, &namespace, &now)?;
                for row in &rows {
                    upsert_entry(&tx, namespace_id, row, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        if !key.is_get() {
            return Ok(None);
        }
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body
                         FROM entries e JOIN namespaces n ON n.id = e.namespace_id
                         WHERE e.key = ?1
                         ORDER BY n.id ASC
                         LIMIT 1",
                        params![hash],
                        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                    )
                    .optional()?;

                let Some((status, headers_json, body)) = row else {
                    return Ok(None);
                };
                let status = u16::try_from(status).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                let headers: BTreeMap<String, String> = serde_json::from_str(&headers_json)?;

                Ok(Some(ResponseSnapshot { status, headers, body: body.into() }))
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM namespaces ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM namespaces WHERE name = ?1", params![namespace])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.method, e.url
                     FROM entries e JOIN namespaces n ON n.id = e.namespace_id
                     WHERE n.name = ?1
                     ORDER BY e.url ASC",
                )?;
                let keys = stmt
                    .query_map(params![namespace], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
