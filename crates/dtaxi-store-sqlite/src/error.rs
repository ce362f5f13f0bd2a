//! Error type for `dtaxi-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored document's id column disagrees with its body.
  #[error("document {collection}/{id} is corrupt: {reason}")]
  Corrupt {
    collection: String,
    id:         uuid::Uuid,
    reason:     String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
