//! In-memory [`RecordStore`] used by this crate's unit tests.

use std::{
  collections::{BTreeMap, HashSet},
  sync::Mutex,
};

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  record::{NewRecord, Record, RecordPatch},
  store::{ChangeEvent, ChangeKind, Direction, ListOptions, RecordStore, Subscription},
};

#[derive(Debug, thiserror::Error)]
#[error("memory store offline for record {0}")]
pub struct Offline(Uuid);

pub struct MemoryStore {
  docs:    Mutex<BTreeMap<(String, Uuid), Record>>,
  failing: Mutex<HashSet<Uuid>>,
  changes: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
  fn default() -> Self {
    Self {
      docs:    Mutex::default(),
      failing: Mutex::default(),
      changes: broadcast::channel(64).0,
    }
  }
}

impl MemoryStore {
  /// Make every write touching `id` fail.
  pub fn fail_on(&self, id: Uuid) { self.failing.lock().unwrap().insert(id); }

  pub fn contains(&self, collection: &str, id: Uuid) -> bool {
    self.record(collection, id).is_some()
  }

  pub fn record(&self, collection: &str, id: Uuid) -> Option<Record> {
    self.docs.lock().unwrap().get(&(collection.to_owned(), id)).cloned()
  }

  /// Number of collections holding `id`.
  pub fn count(&self, id: Uuid) -> usize {
    self.docs.lock().unwrap().keys().filter(|(_, k)| *k == id).count()
  }

  fn check(&self, id: Uuid) -> Result<(), Offline> {
    if self.failing.lock().unwrap().contains(&id) { Err(Offline(id)) } else { Ok(()) }
  }

  fn notify(&self, collection: &str, id: Uuid, kind: ChangeKind) {
    let _ = self.changes.send(ChangeEvent { collection: collection.to_owned(), id, kind });
  }
}

impl RecordStore for MemoryStore {
  type Error = Offline;

  async fn list(&self, collection: &str, options: &ListOptions) -> Result<Vec<Record>, Offline> {
    let mut out: Vec<Record> = self
      .docs
      .lock()
      .unwrap()
      .iter()
      .filter(|((c, _), _)| c == collection)
      .map(|(_, r)| r.clone())
      .collect();
    if let Some(order) = &options.order_by {
      out.sort_by_key(|r| r.submitted_at);
      if order.direction == Direction::Desc {
        out.reverse();
      }
    }
    if let Some(limit) = options.limit {
      out.truncate(limit);
    }
    Ok(out)
  }

  async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Record>, Offline> {
    Ok(self.record(collection, id))
  }

  async fn create(&self, collection: &str, input: NewRecord) -> Result<Record, Offline> {
    let record = input.into_record(Uuid::new_v4(), Utc::now());
    self
      .docs
      .lock()
      .unwrap()
      .insert((collection.to_owned(), record.id), record.clone());
    self.notify(collection, record.id, ChangeKind::Created);
    Ok(record)
  }

  async fn update(
    &self,
    collection: &str,
    id: Uuid,
    patch: RecordPatch,
  ) -> Result<Option<Record>, Offline> {
    self.check(id)?;
    let updated = {
      let mut docs = self.docs.lock().unwrap();
      let Some(record) = docs.get_mut(&(collection.to_owned(), id)) else {
        return Ok(None);
      };
      record.apply_patch(patch);
      record.clone()
    };
    self.notify(collection, id, ChangeKind::Updated);
    Ok(Some(updated))
  }

  async fn move_record<'a, F>(
    &'a self,
    source: &'a str,
    dest: &'a str,
    id: Uuid,
    transform: F,
  ) -> Result<Option<Record>, Offline>
  where
    F: FnOnce(Record) -> Record + Send + 'a,
  {
    self.check(id)?;
    let Some(current) = self.record(source, id) else {
      return Ok(None);
    };
    let moved = transform(current);
    {
      let mut docs = self.docs.lock().unwrap();
      docs.insert((dest.to_owned(), id), moved.clone());
      docs.remove(&(source.to_owned(), id));
    }
    self.notify(dest, id, ChangeKind::Created);
    self.notify(source, id, ChangeKind::Removed);
    Ok(Some(moved))
  }

  fn subscribe(&self, collection: &str) -> Subscription {
    Subscription::new(collection, self.changes.subscribe())
  }
}
