//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use uuid::Uuid;

use dtaxi_core::{
  record::{NewRecord, Record, RecordPatch},
  store::{ChangeEvent, ChangeKind, ListOptions, RecordStore, Subscription},
};

use crate::{
  Result,
  encode::{EncodedDocument, RawDocument, encode_uuid, json_path, order_clause},
  schema::SCHEMA,
};

/// Capacity of the change channel; slower listeners see `Lagged`.
const CHANGE_BUFFER: usize = 256;

// ─── Store ───────────────────────────────────────────────────────────────────

/// The D-TAXI document and object store backed by a single SQLite file.
///
/// Cloning is cheap; the connection and the change channel are shared.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:     tokio_rusqlite::Connection,
  pub(crate) base_url: String,
  changes:             broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  /// Download URLs of stored objects are rooted at `base_url`.
  pub async fn open(path: impl AsRef<Path>, base_url: impl Into<String>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, base_url.into()).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, "http://localhost".to_owned()).await
  }

  async fn init(conn: tokio_rusqlite::Connection, base_url: String) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      base_url: base_url.trim_end_matches('/').to_owned(),
      changes: broadcast::channel(CHANGE_BUFFER).0,
    })
  }

  fn notify(&self, collection: &str, id: Uuid, kind: ChangeKind) {
    // No receivers is not an error.
    let _ = self.changes.send(ChangeEvent { collection: collection.to_owned(), id, kind });
  }

  async fn read(&self, collection: &str, id: Uuid) -> Result<Option<Record>> {
    let collection = collection.to_owned();
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT collection, doc_id, body FROM documents
               WHERE collection = ?1 AND doc_id = ?2",
              rusqlite::params![collection, id_str],
              RawDocument::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_record).transpose()
  }

  /// Insert or replace `record` in `collection`.
  async fn write(&self, collection: &str, record: &Record) -> Result<()> {
    let collection = collection.to_owned();
    let doc = EncodedDocument::from_record(record)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, body, submitted_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (collection, doc_id)
           DO UPDATE SET body = excluded.body, submitted_at = excluded.submitted_at",
          rusqlite::params![collection, doc.doc_id, doc.body, doc.submitted_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, collection: &str, id: Uuid) -> Result<bool> {
    let collection = collection.to_owned();
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn list(&self, collection: &str, options: &ListOptions) -> Result<Vec<Record>> {
    let order = order_clause(options.order_by.as_ref());
    let limit = options.limit.map_or(-1, |l| l as i64);
    let mut params = vec![collection.to_owned()];
    if let Some(o) = options.order_by.as_ref().filter(|o| o.field != "submittedAt") {
      params.push(json_path(&o.field));
    }

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT collection, doc_id, body FROM documents
           WHERE collection = ?1
           {order}
           LIMIT {limit}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_record).collect()
  }

  async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Record>> {
    self.read(collection, id).await
  }

  async fn create(&self, collection: &str, input: NewRecord) -> Result<Record> {
    let record = input.into_record(Uuid::new_v4(), Utc::now());
    self.write(collection, &record).await?;
    self.notify(collection, record.id, ChangeKind::Created);
    tracing::debug!(collection, id = %record.id, "document created");
    Ok(record)
  }

  async fn update(
    &self,
    collection: &str,
    id: Uuid,
    patch: RecordPatch,
  ) -> Result<Option<Record>> {
    let Some(mut record) = self.read(collection, id).await? else {
      return Ok(None);
    };
    record.apply_patch(patch);
    self.write(collection, &record).await?;
    self.notify(collection, id, ChangeKind::Updated);
    Ok(Some(record))
  }

  async fn move_record<'a, F>(
    &'a self,
    source: &'a str,
    dest: &'a str,
    id: Uuid,
    transform: F,
  ) -> Result<Option<Record>>
  where
    F: FnOnce(Record) -> Record + Send + 'a,
  {
    let Some(current) = self.read(source, id).await? else {
      return Ok(None);
    };
    let moved = transform(current);
    if source == dest {
      self.write(dest, &moved).await?;
      self.notify(dest, id, ChangeKind::Updated);
      return Ok(Some(moved));
    }

    // Write before delete: an interruption in between leaves a duplicate.
    self.write(dest, &moved).await?;
    self.notify(dest, id, ChangeKind::Created);
    if self.delete(source, id).await? {
      self.notify(source, id, ChangeKind::Removed);
    }
    tracing::debug!(source, dest, %id, "document moved");
    Ok(Some(moved))
  }

  fn subscribe(&self, collection: &str) -> Subscription {
    Subscription::new(collection, self.changes.subscribe())
  }
}
