//! Ordered, durable queue of mutations not yet confirmed by the backend.
//!
//! A change is either pending (stored) or gone (acknowledged); it is never
//! rewritten in place. Ids come from the collection's auto-increment counter,
//! which never moves backwards, so id order equals insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::StorageError;
use crate::store::{OfflineStore, Record, PENDING_CHANGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
  Create,
  Update,
  Delete,
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Operation::Create => "create",
      Operation::Update => "update",
      Operation::Delete => "delete",
    };
    f.write_str(s)
  }
}

/// A mutation as submitted by the application, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChange {
  pub operation: Operation,
  /// Self-contained body; it must not reference other collections' contents
  pub payload: Value,
}

/// A queued mutation. Its serialized form is also the sync request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
  pub id: i64,
  pub operation: Operation,
  pub payload: Value,
  pub enqueued_at: DateTime<Utc>,
}

impl Record for PendingChange {
  fn collection() -> &'static str {
    PENDING_CHANGES
  }
}

/// Stored shape of a change prior to key assignment.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueuedChange<'a> {
  operation: Operation,
  payload: &'a Value,
  enqueued_at: DateTime<Utc>,
}

/// FIFO queue of pending changes on top of the offline store.
#[derive(Clone)]
pub struct PendingQueue {
  store: Arc<OfflineStore>,
}

impl PendingQueue {
  pub fn new(store: Arc<OfflineStore>) -> Self {
    Self { store }
  }

  /// Append a change. Only touches local storage.
  pub fn enqueue(&self, change: NewChange) -> Result<PendingChange, StorageError> {
    let queued = QueuedChange {
      operation: change.operation,
      payload: &change.payload,
      enqueued_at: Utc::now(),
    };

    let stored = self
      .store
      .put(PENDING_CHANGES, serde_json::to_value(&queued)?)?;
    let change: PendingChange = serde_json::from_value(stored)?;

    debug!(id = change.id, operation = %change.operation, "Enqueued pending change");
    Ok(change)
  }

  /// Point-in-time snapshot of every pending change, oldest first.
  pub fn dequeue_batch(&self) -> Result<Vec<PendingChange>, StorageError> {
    self.store.get_all_records::<PendingChange>()
  }

  /// Drop one change after the server confirmed it. Unknown ids are ignored.
  pub fn ack(&self, id: i64) -> Result<(), StorageError> {
    let removed = self.store.delete(PENDING_CHANGES, &Value::from(id))?;
    if !removed {
      debug!(id, "Ack for change that is no longer queued");
    }
    Ok(())
  }

  /// Number of changes awaiting sync.
  pub fn len(&self) -> Result<usize, StorageError> {
    self.store.count(PENDING_CHANGES)
  }

  pub fn is_empty(&self) -> Result<bool, StorageError> {
    Ok(self.len()? == 0)
  }
}
