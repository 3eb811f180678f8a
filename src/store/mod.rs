//! Durable offline storage shared by the foreground app and the worker.
//!
//! Records are schemaless JSON objects grouped in named collections. Each
//! collection owns its key space and optional secondary indexes. The schema
//! version only ever grows; upgrades add collections and never drop them.

mod record;
pub mod schema;
mod sqlite;

pub use record::Record;
pub use schema::{FAVORITE_RECIPES, PENDING_CHANGES, SHOPPING_LIST};
pub use sqlite::OfflineStore;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::StoreConfig;
use crate::error::StorageError;

/// Lazily opened store. `ensure_open` is idempotent; there is no close.
pub struct StoreHandle {
  path: Option<PathBuf>,
  max_pages: Option<u32>,
  store: OnceCell<Arc<OfflineStore>>,
}

impl StoreHandle {
  /// Handle for the on-disk store described by `config` inside `data_dir`.
  pub fn new(config: &StoreConfig, data_dir: PathBuf) -> Self {
    Self {
      path: Some(data_dir.join(format!("{}.db", config.name))),
      max_pages: config.max_pages,
      store: OnceCell::new(),
    }
  }

  /// Handle whose store lives in memory only.
  pub fn in_memory() -> Self {
    Self {
      path: None,
      max_pages: None,
      store: OnceCell::new(),
    }
  }

  /// Open the store on first use and return the shared instance afterwards.
  pub async fn ensure_open(&self) -> Result<Arc<OfflineStore>, StorageError> {
    self
      .store
      .get_or_try_init(|| async {
        let store = match &self.path {
          Some(path) => OfflineStore::open_at(path, self.max_pages)?,
          None => OfflineStore::open_in_memory()?,
        };
        Ok(Arc::new(store))
      })
      .await
      .cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_ensure_open_returns_same_instance() {
    let handle = StoreHandle::in_memory();

    let first = handle.ensure_open().await.unwrap();
    first.put(SHOPPING_LIST, json!({"name": "Milk"})).unwrap();
    let second = handle.ensure_open().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.count(SHOPPING_LIST).unwrap(), 1);
  }

  #[tokio::test]
  async fn test_handle_uses_configured_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
      name: "dashboard".to_string(),
      data_dir: None,
      max_pages: None,
    };

    let handle = StoreHandle::new(&config, dir.path().to_path_buf());
    handle.ensure_open().await.unwrap();

    assert!(dir.path().join("dashboard.db").exists());
  }
}
