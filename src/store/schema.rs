//! Collection registry and SQL schema for the offline store.

/// Current schema version, stored in `PRAGMA user_version`.
///
/// Versions are strictly additive: a bump may register new collections or
/// indexes but never drops an existing one.
pub const SCHEMA_VERSION: u32 = 2;

pub const SHOPPING_LIST: &str = "shopping_list";
pub const PENDING_CHANGES: &str = "pending_changes";
pub const FAVORITE_RECIPES: &str = "favorite_recipes";

/// How a collection derives the primary key of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
  /// Key read from `key_path`; a record without one is assigned the next
  /// integer and the key is written back into the payload.
  AutoIncrement { key_path: &'static str },
  /// Natural key read from the payload field; it must be present.
  KeyPath(&'static str),
}

impl KeyStrategy {
  pub fn key_path(&self) -> &'static str {
    match self {
      KeyStrategy::AutoIncrement { key_path } => key_path,
      KeyStrategy::KeyPath(path) => path,
    }
  }
}

/// A secondary index over one payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
  pub name: &'static str,
  pub field: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionDef {
  pub name: &'static str,
  pub key: KeyStrategy,
  pub indexes: &'static [IndexDef],
  /// Schema version that introduced the collection
  pub since: u32,
}

pub const COLLECTIONS: &[CollectionDef] = &[
  CollectionDef {
    name: SHOPPING_LIST,
    key: KeyStrategy::AutoIncrement { key_path: "id" },
    indexes: &[
      IndexDef {
        name: "synced",
        field: "synced",
      },
      IndexDef {
        name: "purchased",
        field: "purchased",
      },
    ],
    since: 1,
  },
  CollectionDef {
    name: PENDING_CHANGES,
    key: KeyStrategy::AutoIncrement { key_path: "id" },
    indexes: &[
      IndexDef {
        name: "timestamp",
        field: "enqueuedAt",
      },
      IndexDef {
        name: "type",
        field: "operation",
      },
    ],
    since: 1,
  },
  CollectionDef {
    name: FAVORITE_RECIPES,
    key: KeyStrategy::KeyPath("id"),
    indexes: &[],
    since: 2,
  },
];

pub fn collection(name: &str) -> Option<&'static CollectionDef> {
  COLLECTIONS.iter().find(|c| c.name == name)
}

/// Base tables. Every statement is idempotent.
pub const STORE_SCHEMA: &str = r#"
-- Registered collections; rows are only ever added
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    key_path TEXT NOT NULL,
    auto_increment INTEGER NOT NULL,
    next_key INTEGER NOT NULL DEFAULT 1,
    created_version INTEGER NOT NULL
);

-- Records of every collection (serialized JSON). `seq` preserves insertion order.
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    record_key TEXT NOT NULL,
    data BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (collection, record_key)
);

CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection, seq);

-- Secondary index entries
CREATE TABLE IF NOT EXISTS record_index (
    collection TEXT NOT NULL,
    index_name TEXT NOT NULL,
    index_value TEXT NOT NULL,
    record_key TEXT NOT NULL,
    PRIMARY KEY (collection, index_name, record_key)
);

CREATE INDEX IF NOT EXISTS idx_record_index_lookup
    ON record_index(collection, index_name, index_value);
"#;
