//! SQLite-backed registry. Survives restarts; safe for concurrent upserts.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use keepalive_core::error::{KeepaliveError, Result};
use keepalive_core::traits::Registry;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

fn db_err(e: rusqlite::Error) -> KeepaliveError {
    KeepaliveError::Registry(e.to_string())
}

pub struct SqliteRegistry {
    conn: Mutex<Connection>,
    page_size: u32,
}

impl SqliteRegistry {
    /// Open or create the registry database.
    pub fn open(path: &Path, page_size: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::with_connection(conn, page_size)
    }

    /// Private in-memory database.
    pub fn open_in_memory(page_size: u32) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::with_connection(conn, page_size)
    }

    fn with_connection(conn: Connection, page_size: u32) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS endpoints (
                url TEXT PRIMARY KEY,
                marker TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )
        .map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
            page_size: page_size.max(1),
        })
    }

    /// Up to `limit` keys strictly after `after`, ascending.
    fn page_after(&self, after: &str, limit: u32) -> Result<Vec<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KeepaliveError::Registry(format!("Lock poisoned: {e}")))?;
        let mut stmt = conn
            .prepare_cached("SELECT url FROM endpoints WHERE url > ?1 ORDER BY url LIMIT ?2")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![after, limit], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn execute(&self, sql: &str, args: impl rusqlite::Params) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KeepaliveError::Registry(format!("Lock poisoned: {e}")))?;
        conn.execute(sql, args).map_err(db_err)
    }
}

#[async_trait]
impl Registry for SqliteRegistry {
    fn name(&self) -> &str {
        "sqlite"
    }

    /// Keyset pagination: each page resumes after the last key seen, so
    /// memory stays bounded by `page_size` however large the table grows.
    fn keys(&self) -> BoxStream<'_, Result<String>> {
        let page_size = self.page_size;
        stream::try_unfold(Some(String::new()), move |cursor| async move {
            let Some(after) = cursor else {
                return Ok(None);
            };
            let page = self.page_after(&after, page_size)?;
            let next = if page.len() < page_size as usize {
                None
            } else {
                page.last().cloned()
            };
            Ok::<_, KeepaliveError>(Some((page, next)))
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.execute(
            "INSERT INTO endpoints (url, marker, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET marker = excluded.marker",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        tracing::debug!("💾 Stored endpoint {key}");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self.execute("DELETE FROM endpoints WHERE url = ?1", params![key])?;
        tracing::debug!("🗑 Deleted endpoint {key} (rows: {removed})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn keys(registry: &SqliteRegistry) -> Vec<String> {
        registry.keys().try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn upsert_and_idempotent_delete() {
        let registry = SqliteRegistry::open_in_memory(100).unwrap();
        registry.put("https://a.test", "1").await.unwrap();
        registry.put("https://a.test", "1").await.unwrap();
        assert_eq!(keys(&registry).await, vec!["https://a.test"]);

        registry.delete("https://a.test").await.unwrap();
        registry.delete("https://a.test").await.unwrap();
        assert!(keys(&registry).await.is_empty());
    }

    #[tokio::test]
    async fn pages_through_every_key_in_order() {
        let registry = SqliteRegistry::open_in_memory(3).unwrap();
        let mut expected: Vec<String> = (0..10).map(|i| format!("https://{i:02}.test")).collect();
        for url in expected.iter().rev() {
            registry.put(url, "1").await.unwrap();
        }
        expected.sort();
        assert_eq!(keys(&registry).await, expected);
    }

    #[tokio::test]
    async fn exact_page_multiple_terminates() {
        let registry = SqliteRegistry::open_in_memory(2).unwrap();
        for url in ["https://a.test", "https://b.test", "https://c.test", "https://d.test"] {
            registry.put(url, "1").await.unwrap();
        }
        assert_eq!(keys(&registry).await.len(), 4);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpoints.db");
        {
            let registry = SqliteRegistry::open(&path, 50).unwrap();
            registry.put("https://keep.test", "1").await.unwrap();
        }
        let reopened = SqliteRegistry::open(&path, 50).unwrap();
        assert_eq!(keys(&reopened).await, vec!["https://keep.test"]);
    }
}
