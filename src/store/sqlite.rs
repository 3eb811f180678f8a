//! SQLite-backed offline store.

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::record::Record;
use super::schema::{self, IndexDef, COLLECTIONS, SCHEMA_VERSION, STORE_SCHEMA};
use crate::error::StorageError;

type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Durable, versioned key/value storage organised in named collections.
///
/// Every operation runs inside one SQLite transaction behind the connection
/// mutex; that transaction is the only serialization point for shared state.
pub struct OfflineStore {
  conn: Mutex<Connection>,
}

/// Collection properties as persisted in the `collections` table.
struct CollectionMeta {
  name: String,
  key_path: String,
  auto_increment: bool,
  indexes: &'static [IndexDef],
}

impl OfflineStore {
  /// Open (creating or upgrading) the store at `path`.
  pub fn open_at(path: &Path, max_pages: Option<u32>) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    Self::from_connection(conn, max_pages)
  }

  /// Open a throwaway store that lives as long as the returned value.
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?, None)
  }

  fn from_connection(conn: Connection, max_pages: Option<u32>) -> Result<Self> {
    conn.busy_timeout(Duration::from_secs(5))?;
    if let Some(pages) = max_pages {
      conn.pragma_update_and_check(None, "max_page_count", pages, |row| row.get::<_, i64>(0))?;
    }

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Bring the schema up to `SCHEMA_VERSION`. Idempotent and additive only.
  fn run_migrations(&self) -> Result<()> {
    let mut conn = self.lock();
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if found > SCHEMA_VERSION {
      return Err(StorageError::VersionTooNew {
        found,
        supported: SCHEMA_VERSION,
      });
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(STORE_SCHEMA)?;

    for def in COLLECTIONS {
      let (key_path, auto_increment) = match def.key {
        schema::KeyStrategy::AutoIncrement { key_path } => (key_path, true),
        schema::KeyStrategy::KeyPath(key_path) => (key_path, false),
      };
      tx.execute(
        "INSERT OR IGNORE INTO collections (name, key_path, auto_increment, created_version)
         VALUES (?, ?, ?, ?)",
        params![def.name, key_path, auto_increment, def.since],
      )?;
    }

    if found < SCHEMA_VERSION {
      // Indexes introduced by this version need entries for records already stored
      for def in COLLECTIONS {
        reindex_collection(&tx, def.name, def.indexes)?;
      }
      tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
      info!(from = found, to = SCHEMA_VERSION, "Upgraded offline store schema");
    }

    tx.commit()?;
    Ok(())
  }

  /// A panic inside a transaction rolls it back while unwinding, so the
  /// connection behind a poisoned lock is still consistent.
  fn lock(&self) -> MutexGuard<'_, Connection> {
    self.conn.lock().unwrap_or_else(|poisoned| {
      warn!("Offline store lock was poisoned, recovering connection");
      poisoned.into_inner()
    })
  }

  /// Run `op` in a transaction; an aborted transaction is retried once.
  fn transaction<T, F>(&self, mut op: F) -> Result<T>
  where
    F: FnMut(&Transaction<'_>) -> Result<T>,
  {
    match self.try_transaction(&mut op) {
      Err(e) if e.is_abort() => {
        warn!(error = %e, "Offline store transaction aborted, retrying once");
        self.try_transaction(&mut op)
      }
      other => other,
    }
  }

  fn try_transaction<T, F>(&self, op: &mut F) -> Result<T>
  where
    F: FnMut(&Transaction<'_>) -> Result<T>,
  {
    let mut conn = self.lock();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let out = op(&tx)?;
    tx.commit()?;
    Ok(out)
  }

  /// Current schema version of the open database.
  pub fn version(&self) -> Result<u32> {
    let conn = self.lock();
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
  }

  /// Names of every registered collection.
  pub fn collections(&self) -> Result<Vec<String>> {
    self.transaction(|tx| {
      let mut stmt = tx.prepare("SELECT name FROM collections ORDER BY name")?;
      let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
      Ok(names)
    })
  }

  /// Upsert a record by primary key and return it as stored.
  pub fn put(&self, collection: &str, record: Value) -> Result<Value> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      put_record(tx, &meta, record.clone())
    })
  }

  /// Upsert several records atomically.
  pub fn put_all(&self, collection: &str, records: Vec<Value>) -> Result<Vec<Value>> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      records
        .iter()
        .cloned()
        .map(|record| put_record(tx, &meta, record))
        .collect()
    })
  }

  pub fn get(&self, collection: &str, key: &Value) -> Result<Option<Value>> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      let key = encode_key(key).ok_or_else(|| missing_key(&meta))?;
      let data: Option<Vec<u8>> = tx
        .query_row(
          "SELECT data FROM records WHERE collection = ? AND record_key = ?",
          params![meta.name, key],
          |row| row.get(0),
        )
        .optional()?;

      Ok(data.map(|d| serde_json::from_slice(&d)).transpose()?)
    })
  }

  /// Every record of the collection, in insertion order.
  pub fn get_all(&self, collection: &str) -> Result<Vec<Value>> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      let mut stmt = tx.prepare("SELECT data FROM records WHERE collection = ? ORDER BY seq")?;
      let rows = stmt
        .query_map(params![meta.name], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      decode_all(rows)
    })
  }

  /// Records whose indexed field equals `value`, in insertion order.
  pub fn get_all_by_index(&self, collection: &str, index: &str, value: &Value) -> Result<Vec<Value>> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      if !meta.indexes.iter().any(|i| i.name == index) {
        return Err(StorageError::UnknownIndex {
          collection: meta.name.clone(),
          index: index.to_string(),
        });
      }

      let mut stmt = tx.prepare(
        "SELECT r.data FROM records r
         INNER JOIN record_index ri
           ON ri.collection = r.collection AND ri.record_key = r.record_key
         WHERE ri.collection = ? AND ri.index_name = ? AND ri.index_value = ?
         ORDER BY r.seq",
      )?;
      let rows = stmt
        .query_map(params![meta.name, index, value.to_string()], |row| {
          row.get::<_, Vec<u8>>(0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      decode_all(rows)
    })
  }

  pub fn count(&self, collection: &str) -> Result<usize> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM records WHERE collection = ?",
        params![meta.name],
        |row| row.get(0),
      )?;
      Ok(n as usize)
    })
  }

  /// Remove one record. Returns whether a record was removed.
  pub fn delete(&self, collection: &str, key: &Value) -> Result<bool> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      let key = encode_key(key).ok_or_else(|| missing_key(&meta))?;
      tx.execute(
        "DELETE FROM record_index WHERE collection = ? AND record_key = ?",
        params![meta.name, key],
      )?;
      let removed = tx.execute(
        "DELETE FROM records WHERE collection = ? AND record_key = ?",
        params![meta.name, key],
      )?;
      Ok(removed > 0)
    })
  }

  /// Empty a collection. Auto-increment counters are kept.
  pub fn clear(&self, collection: &str) -> Result<()> {
    self.transaction(|tx| {
      let meta = collection_meta(tx, collection)?;
      tx.execute(
        "DELETE FROM record_index WHERE collection = ?",
        params![meta.name],
      )?;
      let removed = tx.execute("DELETE FROM records WHERE collection = ?", params![meta.name])?;
      debug!(collection = %meta.name, removed, "Cleared collection");
      Ok(())
    })
  }

  /// Typed upsert for records that know their collection.
  pub fn put_record<T: Record>(&self, record: &T) -> Result<T> {
    let stored = self.put(T::collection(), serde_json::to_value(record)?)?;
    Ok(serde_json::from_value(stored)?)
  }

  /// Typed read of every record in `T`'s collection, in insertion order.
  pub fn get_all_records<T: Record>(&self) -> Result<Vec<T>> {
    self
      .get_all(T::collection())?
      .into_iter()
      .map(|v| serde_json::from_value(v).map_err(StorageError::from))
      .collect()
  }
}

fn collection_meta(tx: &Transaction<'_>, name: &str) -> Result<CollectionMeta> {
  let row: Option<(String, bool)> = tx
    .query_row(
      "SELECT key_path, auto_increment FROM collections WHERE name = ?",
      params![name],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;

  let (key_path, auto_increment) =
    row.ok_or_else(|| StorageError::UnknownCollection(name.to_string()))?;

  Ok(CollectionMeta {
    name: name.to_string(),
    key_path,
    auto_increment,
    indexes: schema::collection(name).map(|c| c.indexes).unwrap_or(&[]),
  })
}

fn put_record(tx: &Transaction<'_>, meta: &CollectionMeta, mut record: Value) -> Result<Value> {
  let obj = record.as_object_mut().ok_or_else(|| missing_key(meta))?;

  let key = match obj.get(&meta.key_path).filter(|v| !v.is_null()) {
    Some(v) => {
      let key = encode_key(v).ok_or_else(|| missing_key(meta))?;
      if meta.auto_increment {
        if let Some(n) = v.as_i64() {
          tx.execute(
            "UPDATE collections SET next_key = MAX(next_key, ?) WHERE name = ?",
            params![successor(meta, n)?, meta.name],
          )?;
        }
      }
      key
    }
    None if meta.auto_increment => {
      let next: i64 = tx.query_row(
        "SELECT next_key FROM collections WHERE name = ?",
        params![meta.name],
        |row| row.get(0),
      )?;
      tx.execute(
        "UPDATE collections SET next_key = ? WHERE name = ?",
        params![successor(meta, next)?, meta.name],
      )?;
      obj.insert(meta.key_path.clone(), Value::from(next));
      next.to_string()
    }
    None => return Err(missing_key(meta)),
  };

  let data = serde_json::to_vec(&record)?;
  tx.execute(
    "INSERT INTO records (collection, record_key, data) VALUES (?, ?, ?)
     ON CONFLICT (collection, record_key)
     DO UPDATE SET data = excluded.data, stored_at = datetime('now')",
    params![meta.name, key, data],
  )?;

  write_index_entries(tx, &meta.name, meta.indexes, &key, record.as_object())?;
  Ok(record)
}

fn write_index_entries(
  tx: &Transaction<'_>,
  collection: &str,
  indexes: &[IndexDef],
  key: &str,
  record: Option<&Map<String, Value>>,
) -> Result<()> {
  tx.execute(
    "DELETE FROM record_index WHERE collection = ? AND record_key = ?",
    params![collection, key],
  )?;

  let Some(record) = record else {
    return Ok(());
  };

  for index in indexes {
    // Records without the field are simply absent from the index
    if let Some(value) = record.get(index.field).filter(|v| !v.is_null()) {
      tx.execute(
        "INSERT INTO record_index (collection, index_name, index_value, record_key)
         VALUES (?, ?, ?, ?)",
        params![collection, index.name, value.to_string(), key],
      )?;
    }
  }
  Ok(())
}

fn reindex_collection(tx: &Transaction<'_>, collection: &str, indexes: &[IndexDef]) -> Result<()> {
  if indexes.is_empty() {
    return Ok(());
  }

  let rows: Vec<(String, Vec<u8>)> = {
    let mut stmt = tx.prepare("SELECT record_key, data FROM records WHERE collection = ?")?;
    let rows = stmt
      .query_map(params![collection], |row| Ok((row.get(0)?, row.get(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    rows
  };

  for (key, data) in rows {
    let record: Value = serde_json::from_slice(&data)?;
    write_index_entries(tx, collection, indexes, &key, record.as_object())?;
  }
  Ok(())
}

/// Canonical text form of a primary key. Only integers and strings are keys.
fn encode_key(key: &Value) -> Option<String> {
  match key {
    Value::Number(n) => n.as_i64().map(|n| n.to_string()),
    Value::String(s) => Some(Value::String(s.clone()).to_string()),
    _ => None,
  }
}

/// Next auto-increment value after `key`, refusing to wrap.
fn successor(meta: &CollectionMeta, key: i64) -> Result<i64> {
  key.checked_add(1).ok_or_else(|| StorageError::KeyOutOfRange {
    collection: meta.name.clone(),
    key,
  })
}

fn missing_key(meta: &CollectionMeta) -> StorageError {
  StorageError::MissingKey {
    collection: meta.name.clone(),
    key_path: meta.key_path.clone(),
  }
}

fn decode_all(rows: Vec<Vec<u8>>) -> Result<Vec<Value>> {
  rows
    .iter()
    .map(|d| serde_json::from_slice(d).map_err(StorageError::from))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::schema::{FAVORITE_RECIPES, PENDING_CHANGES, SHOPPING_LIST};
  use serde_json::json;

  #[test]
  fn test_open_registers_all_collections() {
    let store = OfflineStore::open_in_memory().unwrap();
    assert_eq!(
      store.collections().unwrap(),
      vec![FAVORITE_RECIPES, PENDING_CHANGES, SHOPPING_LIST]
    );
    assert_eq!(store.version().unwrap(), SCHEMA_VERSION);
  }

  #[test]
  fn test_put_then_get_all_returns_record_verbatim() {
    let store = OfflineStore::open_in_memory().unwrap();
    let milk = json!({"id": 1, "name": "Milk", "purchased": false});

    store.put(SHOPPING_LIST, milk.clone()).unwrap();

    assert_eq!(store.get_all(SHOPPING_LIST).unwrap(), vec![milk]);
  }

  #[test]
  fn test_auto_increment_assigns_and_writes_back_key() {
    let store = OfflineStore::open_in_memory().unwrap();

    let first = store.put(SHOPPING_LIST, json!({"name": "Eggs"})).unwrap();
    let second = store.put(SHOPPING_LIST, json!({"name": "Bread"})).unwrap();

    assert_eq!(first["id"], json!(1));
    assert_eq!(second["id"], json!(2));
  }

  #[test]
  fn test_explicit_key_advances_counter() {
    let store = OfflineStore::open_in_memory().unwrap();

    store.put(SHOPPING_LIST, json!({"id": 10, "name": "Tea"})).unwrap();
    let next = store.put(SHOPPING_LIST, json!({"name": "Rice"})).unwrap();

    assert_eq!(next["id"], json!(11));
  }

  #[test]
  fn test_largest_explicit_key_is_rejected_without_breaking_store() {
    let store = OfflineStore::open_in_memory().unwrap();

    let err = store
      .put(SHOPPING_LIST, json!({"id": i64::MAX, "name": "x"}))
      .unwrap_err();
    assert!(matches!(err, StorageError::KeyOutOfRange { key: i64::MAX, .. }));

    let milk = store.put(SHOPPING_LIST, json!({"name": "Milk"})).unwrap();
    assert_eq!(milk["id"], json!(1));
    assert_eq!(store.get_all(SHOPPING_LIST).unwrap(), vec![milk]);
  }

  #[test]
  fn test_panic_inside_transaction_does_not_poison_store() {
    let store = OfflineStore::open_in_memory().unwrap();

    let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      store.transaction(|tx| -> Result<()> {
        tx.execute(
          "INSERT INTO records (collection, record_key, data) VALUES ('shopping_list', '99', x'7b7d')",
          [],
        )?;
        panic!("handler bug");
      })
    }));
    assert!(panicked.is_err());

    // The half-done write was rolled back and the store keeps working
    assert_eq!(store.count(SHOPPING_LIST).unwrap(), 0);
    store.put(SHOPPING_LIST, json!({"name": "Milk"})).unwrap();
    assert_eq!(store.count(SHOPPING_LIST).unwrap(), 1);
  }

  #[test]
  fn test_aborted_transaction_is_retried_once() {
    let store = OfflineStore::open_in_memory().unwrap();

    let mut attempts = 0;
    let value = store
      .transaction(|_| {
        attempts += 1;
        if attempts == 1 {
          Err(StorageError::Aborted("database is locked".to_string()))
        } else {
          Ok(7)
        }
      })
      .unwrap();
    assert_eq!((attempts, value), (2, 7));

    let mut attempts = 0;
    let err = store
      .transaction(|_| -> Result<()> {
        attempts += 1;
        Err(StorageError::Aborted("database is locked".to_string()))
      })
      .unwrap_err();
    assert_eq!(attempts, 2);
    assert!(err.is_abort());

    let mut attempts = 0;
    let _ = store.transaction(|_| -> Result<()> {
      attempts += 1;
      Err(StorageError::UnknownCollection("chores".to_string()))
    });
    assert_eq!(attempts, 1);
  }

  #[test]
  fn test_write_lock_held_elsewhere_surfaces_abort() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let store = OfflineStore::open_at(&path, None).unwrap();
    store.lock().busy_timeout(Duration::from_millis(20)).unwrap();

    let other = Connection::open(&path).unwrap();
    other.execute_batch("BEGIN IMMEDIATE").unwrap();

    let err = store.put(SHOPPING_LIST, json!({"name": "Milk"})).unwrap_err();
    assert!(err.is_abort());

    other.execute_batch("COMMIT").unwrap();
    store.put(SHOPPING_LIST, json!({"name": "Milk"})).unwrap();
    assert_eq!(store.count(SHOPPING_LIST).unwrap(), 1);
  }

  #[test]
  fn test_put_upserts_by_key() {
    let store = OfflineStore::open_in_memory().unwrap();

    store.put(SHOPPING_LIST, json!({"id": 1, "name": "Milk", "purchased": false})).unwrap();
    store.put(SHOPPING_LIST, json!({"id": 1, "name": "Milk", "purchased": true})).unwrap();

    let all = store.get_all(SHOPPING_LIST).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["purchased"], json!(true));
  }

  #[test]
  fn test_natural_key_is_required() {
    let store = OfflineStore::open_in_memory().unwrap();

    let err = store.put(FAVORITE_RECIPES, json!({"title": "Soup"})).unwrap_err();
    assert!(matches!(err, StorageError::MissingKey { .. }));

    store.put(FAVORITE_RECIPES, json!({"id": "lasagne", "title": "Lasagne"})).unwrap();
    let found = store.get(FAVORITE_RECIPES, &json!("lasagne")).unwrap();
    assert_eq!(found.unwrap()["title"], json!("Lasagne"));
  }

  #[test]
  fn test_secondary_index_follows_updates() {
    let store = OfflineStore::open_in_memory().unwrap();
    store.put(SHOPPING_LIST, json!({"id": 1, "name": "Milk", "purchased": false})).unwrap();
    store.put(SHOPPING_LIST, json!({"id": 2, "name": "Jam", "purchased": false})).unwrap();
    store.put(SHOPPING_LIST, json!({"id": 1, "name": "Milk", "purchased": true})).unwrap();

    let open = store
      .get_all_by_index(SHOPPING_LIST, "purchased", &json!(false))
      .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["name"], json!("Jam"));

    assert!(store
      .get_all_by_index(SHOPPING_LIST, "colour", &json!("red"))
      .is_err());
  }

  #[test]
  fn test_delete_and_clear() {
    let store = OfflineStore::open_in_memory().unwrap();
    store.put(SHOPPING_LIST, json!({"name": "A"})).unwrap();
    store.put(SHOPPING_LIST, json!({"name": "B"})).unwrap();

    assert!(store.delete(SHOPPING_LIST, &json!(1)).unwrap());
    assert!(!store.delete(SHOPPING_LIST, &json!(1)).unwrap());
    assert_eq!(store.count(SHOPPING_LIST).unwrap(), 1);

    store.clear(SHOPPING_LIST).unwrap();
    assert!(store.get_all(SHOPPING_LIST).unwrap().is_empty());

    // Counter survives a clear
    let next = store.put(SHOPPING_LIST, json!({"name": "C"})).unwrap();
    assert_eq!(next["id"], json!(3));
  }

  #[test]
  fn test_unknown_collection_is_an_error() {
    let store = OfflineStore::open_in_memory().unwrap();
    let err = store.get_all("recipes_v0").unwrap_err();
    assert!(matches!(err, StorageError::UnknownCollection(_)));
  }

  #[test]
  fn test_reopen_preserves_data_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    {
      let store = OfflineStore::open_at(&path, None).unwrap();
      store.put(SHOPPING_LIST, json!({"name": "Milk"})).unwrap();
    }

    let store = OfflineStore::open_at(&path, None).unwrap();
    let again = OfflineStore::open_at(&path, None).unwrap();
    assert_eq!(store.get_all(SHOPPING_LIST).unwrap().len(), 1);
    assert_eq!(again.version().unwrap(), SCHEMA_VERSION);
  }

  #[test]
  fn test_upgrade_keeps_collections_unknown_to_this_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    {
      let conn = Connection::open(&path).unwrap();
      conn.execute_batch(STORE_SCHEMA).unwrap();
      conn
        .execute(
          "INSERT INTO collections (name, key_path, auto_increment, created_version)
           VALUES ('meal_plans', 'id', 1, 1)",
          [],
        )
        .unwrap();
      conn.pragma_update(None, "user_version", 1u32).unwrap();
    }

    let store = OfflineStore::open_at(&path, None).unwrap();
    let names = store.collections().unwrap();
    assert!(names.contains(&"meal_plans".to_string()));
    assert!(names.contains(&FAVORITE_RECIPES.to_string()));

    store.put("meal_plans", json!({"day": "monday"})).unwrap();
    assert_eq!(store.count("meal_plans").unwrap(), 1);
  }

  #[test]
  fn test_newer_database_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    {
      let conn = Connection::open(&path).unwrap();
      conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();
    }

    let err = OfflineStore::open_at(&path, None).err().unwrap();
    assert!(matches!(err, StorageError::VersionTooNew { .. }));
  }

  #[test]
  fn test_quota_exhaustion_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let store = OfflineStore::open_at(&path, Some(32)).unwrap();

    let blob = "x".repeat(4096);
    let mut outcome = Ok(Value::Null);
    for _ in 0..64 {
      outcome = store.put(SHOPPING_LIST, json!({"name": blob}));
      if outcome.is_err() {
        break;
      }
    }

    assert!(matches!(outcome, Err(StorageError::QuotaExceeded)));
  }
}
