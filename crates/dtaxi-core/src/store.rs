//! The `RecordStore` and `ObjectStore` traits and supporting types.
//!
//! The traits are implemented by storage backends (e.g.
//! `dtaxi-store-sqlite`). Higher layers (`dtaxi-api`, the lifecycle handler)
//! depend on these abstractions, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error, Result,
  record::{NewRecord, Record, RecordPatch},
};

// ─── List options ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
  Asc,
  #[default]
  Desc,
}

/// Order by a top-level document field (e.g. `submittedAt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
  pub field:     String,
  pub direction: Direction,
}

/// Parameters for [`RecordStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
  pub order_by: Option<OrderBy>,
  pub limit:    Option<usize>,
}

impl ListOptions {
  /// Newest submissions first. Every area lists this way.
  pub fn newest_first() -> Self {
    Self {
      order_by: Some(OrderBy {
        field:     "submittedAt".into(),
        direction: Direction::Desc,
      }),
      limit:    None,
    }
  }
}

// ─── Change notifications ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Created,
  Updated,
  Removed,
}

/// Emitted for every write, to subscribers of the affected collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub collection: String,
  pub id:         Uuid,
  pub kind:       ChangeKind,
}

/// A live listener on one collection. Dropping it unsubscribes.
pub struct Subscription {
  collection: String,
  receiver:   broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
  pub fn new(collection: impl Into<String>, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
    Self { collection: collection.into(), receiver }
  }

  pub fn collection(&self) -> &str { &self.collection }

  /// Wait for the next change on this collection. Returns `None` once the
  /// store is gone. A lagging listener skips the missed events; it should
  /// refetch rather than rely on the event stream being complete.
  pub async fn next(&mut self) -> Option<ChangeEvent> {
    loop {
      match self.receiver.recv().await {
        Ok(event) if event.collection == self.collection => return Some(event),
        Ok(_) => continue,
        Err(broadcast::error::RecvError::Lagged(missed)) => {
          tracing::warn!(collection = %self.collection, missed, "change listener lagged");
          continue;
        }
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}

// ─── RecordStore ─────────────────────────────────────────────────────────────

/// Abstraction over the document database.
///
/// Collections are plain names (`reclamacoes`, `elogios-arquivados`, ...);
/// a record is addressed by `(collection, id)`. "Not found" is reported as
/// `Ok(None)`; `Err` always means the backend itself failed.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// List a collection, optionally ordered and limited.
  fn list<'a>(
    &'a self,
    collection: &'a str,
    options: &'a ListOptions,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  fn get<'a>(
    &'a self,
    collection: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Persist a new record; the id is assigned here.
  fn create<'a>(
    &'a self,
    collection: &'a str,
    input: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + 'a;

  /// Merge `patch` into an existing record. `Ok(None)` if `id` is absent.
  fn update<'a>(
    &'a self,
    collection: &'a str,
    id: Uuid,
    patch: RecordPatch,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Move a record between collections under the same id.
  ///
  /// Strictly ordered: read from `source`, apply `transform`, write to
  /// `dest`, delete from `source`. An interruption after the write leaves a
  /// duplicate in `source`, never a lost record. `Ok(None)` if `id` is not
  /// in `source`.
  fn move_record<'a, F>(
    &'a self,
    source: &'a str,
    dest: &'a str,
    id: Uuid,
    transform: F,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a
  where
    F: FnOnce(Record) -> Record + Send + 'a;

  /// Listen for writes on `collection`.
  fn subscribe(&self, collection: &str) -> Subscription;
}

// ─── ObjectStore ─────────────────────────────────────────────────────────────

/// Metadata of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
  pub key:          String,
  /// Durable download URL; stored back onto document fields.
  pub url:          String,
  pub content_type: String,
  /// SHA-256 hex digest of the content.
  pub content_hash: String,
  pub size:         u64,
}

/// Abstraction over the object storage service.
pub trait ObjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` under `key`, replacing any previous content.
  fn put_object<'a>(
    &'a self,
    key: &'a str,
    content_type: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<StoredObject, Self::Error>> + Send + 'a;

  /// Fetch `(content_type, bytes)` for `key`.
  fn get_object<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<(String, Vec<u8>)>, Self::Error>> + Send + 'a;

  /// The download URL for `key`, if it exists.
  fn object_url<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;
}

/// Object key for a file attached to an integration class
/// (`uploads/{turmaId}/{filename}`).
///
/// Only the final path component of `filename` is kept.
pub fn upload_key(turma_id: &str, filename: &str) -> Result<String> {
  let turma_id = turma_id.trim();
  if turma_id.is_empty() || turma_id.contains('/') {
    return Err(Error::ValidationFailed(format!("invalid class id {turma_id:?}")));
  }
  let name = filename
    .rsplit(['/', '\\'])
    .next()
    .map(str::trim)
    .unwrap_or_default();
  if name.is_empty() || name == "." || name == ".." {
    return Err(Error::ValidationFailed(format!("invalid file name {filename:?}")));
  }
  Ok(format!("uploads/{turma_id}/{name}"))
}
