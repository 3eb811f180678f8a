//! Error taxonomy shared by every component of the sync engine.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error returned by the library.
#[derive(Debug, Error)]
pub enum Error {
  /// Request rejected, timed out, or answered with a non-2xx status
  #[error("network error: {0}")]
  Network(#[from] NetworkError),

  /// Transaction abort, quota exhaustion, or a schema problem
  #[error("storage error: {0}")]
  Storage(#[from] StorageError),

  /// Malformed message bus request
  #[error("protocol error: {0}")]
  Protocol(String),

  /// Install or activation step failed
  #[error("lifecycle error: {0}")]
  Lifecycle(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
  #[error("request timed out")]
  Timeout,

  #[error("server responded with status {0}")]
  Status(u16),

  #[error("transport failure: {0}")]
  Transport(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage quota exceeded")]
  QuotaExceeded,

  #[error("transaction aborted: {0}")]
  Aborted(String),

  #[error("database schema version {found} is newer than supported version {supported}")]
  VersionTooNew { found: u32, supported: u32 },

  #[error("unknown collection '{0}'")]
  UnknownCollection(String),

  #[error("collection '{collection}' has no index '{index}'")]
  UnknownIndex { collection: String, index: String },

  #[error("record in '{collection}' has no usable key at '{key_path}'")]
  MissingKey {
    collection: String,
    key_path: String,
  },

  #[error("key {key} in '{collection}' leaves no room for the next generated key")]
  KeyOutOfRange { collection: String, key: i64 },

  #[error("failed to (de)serialize record: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("sqlite: {0}")]
  Sqlite(rusqlite::Error),

  #[error("failed to prepare storage location: {0}")]
  Io(#[from] std::io::Error),
}

impl StorageError {
  /// Whether the failure is a transient abort worth one more attempt.
  pub fn is_abort(&self) -> bool {
    matches!(self, StorageError::Aborted(_))
  }
}

impl From<rusqlite::Error> for StorageError {
  fn from(err: rusqlite::Error) -> Self {
    use rusqlite::ErrorCode;

    match err.sqlite_error_code() {
      Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded,
      Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
        StorageError::Aborted(err.to_string())
      }
      _ => StorageError::Sqlite(err),
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    Error::Storage(err.into())
  }
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Error::Storage(err.into())
  }
}

impl From<reqwest::Error> for NetworkError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      NetworkError::Timeout
    } else if let Some(status) = err.status() {
      NetworkError::Status(status.as_u16())
    } else {
      NetworkError::Transport(err.to_string())
    }
  }
}
