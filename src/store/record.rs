//! Typed records stored in a known collection.

use serde::{de::DeserializeOwned, Serialize};

/// A record type bound to one collection of the offline store.
///
/// The serialized form must be a JSON object carrying the collection's key
/// field (or leaving it out for auto-increment collections).
pub trait Record: Serialize + DeserializeOwned {
  /// Collection the record lives in (e.g. "pending_changes")
  fn collection() -> &'static str;
}
