//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::types::{CacheEntry, CachedEntry};
use crate::error::StorageError;

type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Trait for asset cache backends. Caches are named; entries are unique per
/// (cache name, key) and a later put replaces an earlier one.
pub trait CacheStorage: Send + Sync {
  /// Store a single entry, creating the cache if needed.
  fn put(&self, cache: &str, entry: &CacheEntry) -> Result<()>;

  /// Store all entries or none of them.
  fn put_all(&self, cache: &str, entries: &[CacheEntry]) -> Result<()>;

  /// Exact-key lookup.
  fn lookup(&self, cache: &str, key: &str) -> Result<Option<CachedEntry>>;

  /// Names of every existing cache, oldest first.
  fn cache_names(&self) -> Result<Vec<String>>;

  /// Delete a cache and all its entries. Returns whether it existed.
  fn delete_cache(&self, cache: &str) -> Result<bool>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteCacheStorage {
  conn: Mutex<Connection>,
}

impl SqliteCacheStorage {
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    Self::from_connection(Connection::open(path)?)
  }

  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn.execute_batch(CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> MutexGuard<'_, Connection> {
    self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS caches (
    cache_name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS cache_entries (
    cache_name TEXT NOT NULL,
    key_hash TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (cache_name, key_hash),
    FOREIGN KEY (cache_name) REFERENCES caches(cache_name) ON DELETE CASCADE
);
"#;

fn insert_entry(conn: &Connection, cache: &str, entry: &CacheEntry) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO caches (cache_name) VALUES (?)",
    params![cache],
  )?;
  conn.execute(
    "INSERT OR REPLACE INTO cache_entries (cache_name, key_hash, url, status, content_type, body, cached_at)
     VALUES (?, ?, ?, ?, ?, ?, datetime('now'))",
    params![
      cache,
      key_hash(&entry.key),
      entry.key,
      entry.status,
      entry.content_type,
      entry.body
    ],
  )?;
  Ok(())
}

impl CacheStorage for SqliteCacheStorage {
  fn put(&self, cache: &str, entry: &CacheEntry) -> Result<()> {
    let conn = self.lock();
    insert_entry(&conn, cache, entry)
  }

  fn put_all(&self, cache: &str, entries: &[CacheEntry]) -> Result<()> {
    let mut conn = self.lock();
    let tx = conn.transaction()?;

    tx.execute(
      "INSERT OR IGNORE INTO caches (cache_name) VALUES (?)",
      params![cache],
    )?;
    for entry in entries {
      insert_entry(&tx, cache, entry)?;
    }

    tx.commit()?;
    Ok(())
  }

  fn lookup(&self, cache: &str, key: &str) -> Result<Option<CachedEntry>> {
    let conn = self.lock();

    let row: Option<(String, u16, Option<String>, Vec<u8>, String)> = conn
      .query_row(
        "SELECT url, status, content_type, body, cached_at FROM cache_entries
         WHERE cache_name = ? AND key_hash = ?",
        params![cache, key_hash(key)],
        |row| {
          Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
          ))
        },
      )
      .optional()?;

    match row {
      Some((url, status, content_type, body, cached_at)) => Ok(Some(CachedEntry {
        entry: CacheEntry {
          key: url,
          status,
          content_type,
          body,
        },
        cached_at: parse_datetime(&cached_at),
      })),
      None => Ok(None),
    }
  }

  fn cache_names(&self) -> Result<Vec<String>> {
    let conn = self.lock();
    let mut stmt = conn.prepare("SELECT cache_name FROM caches ORDER BY rowid")?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
  }

  fn delete_cache(&self, cache: &str) -> Result<bool> {
    let mut conn = self.lock();
    let tx = conn.transaction()?;
    tx.execute(
      "DELETE FROM cache_entries WHERE cache_name = ?",
      params![cache],
    )?;
    let removed = tx.execute("DELETE FROM caches WHERE cache_name = ?", params![cache])?;
    tx.commit()?;
    Ok(removed > 0)
  }
}

/// SHA256 hash for stable, fixed-length row keys.
fn key_hash(key: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(key.as_bytes());
  hex::encode(hasher.finalize())
}

/// Parse a datetime string from SQLite format ("YYYY-MM-DD HH:MM:SS").
fn parse_datetime(s: &str) -> DateTime<Utc> {
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .unwrap_or_else(|_| Utc::now())
}
