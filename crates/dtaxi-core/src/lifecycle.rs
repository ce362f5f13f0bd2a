//! Status/lifecycle transitions.
//!
//! Every state change of a record goes through [`Lifecycle`]. A transition
//! appends exactly one history entry and, when it changes which collection
//! the record belongs in, is carried out as a single
//! [`RecordStore::move_record`] with all field updates folded into the
//! transform.
//!
//! ```text
//!   pendente ──resolve──▶ respondido
//!      │                      │
//!      └──archive──▶ arquivado ◀──archive──┘
//!                       │
//!                   unarchive ──▶ status held before archiving
//!
//!   migrate: any live record, category change only
//! ```

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  area::FeatureArea,
  record::{Actor, HistoryEntry, NewRecord, Record, RecordPatch, Status},
  store::RecordStore,
};

// ─── Transition ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
  /// pendente → respondido.
  Resolve,
  /// pendente | respondido → arquivado; moves to the archive collection.
  Archive,
  /// arquivado → previous status; moves back to the live collection.
  Unarchive,
  /// Category change, orthogonal to status.
  Migrate { to: String },
}

impl fmt::Display for Transition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Resolve => f.write_str("resolve"),
      Self::Archive => f.write_str("archive"),
      Self::Unarchive => f.write_str("unarchive"),
      Self::Migrate { to } => write!(f, "migrate to {to:?}"),
    }
  }
}

/// Where a record currently lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub collection: String,
  pub archived:   bool,
}

/// The result of one successful transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
  pub record: Record,
  pub from:   Location,
  pub to:     Location,
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

/// Per-record result of a bulk transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BulkItem {
  Done { outcome: TransitionOutcome },
  Failed { id: Uuid, error: String },
  /// Not attempted because an earlier record failed.
  Skipped { id: Uuid },
}

/// Itemised report of a bulk transition. Records before the first failure
/// stay transitioned; nothing is rolled back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkReport {
  pub items: Vec<BulkItem>,
}

impl BulkReport {
  pub fn succeeded(&self) -> usize {
    self.items.iter().filter(|i| matches!(i, BulkItem::Done { .. })).count()
  }

  pub fn failed(&self) -> usize {
    self.items.iter().filter(|i| matches!(i, BulkItem::Failed { .. })).count()
  }

  pub fn skipped(&self) -> usize {
    self.items.iter().filter(|i| matches!(i, BulkItem::Skipped { .. })).count()
  }

  pub fn outcomes(&self) -> impl Iterator<Item = &TransitionOutcome> {
    self.items.iter().filter_map(|i| match i {
      BulkItem::Done { outcome } => Some(outcome),
      _ => None,
    })
  }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Transition handler for one feature area over a [`RecordStore`].
pub struct Lifecycle<'a, S> {
  store: &'a S,
  area:  &'a FeatureArea,
}

impl<'a, S: RecordStore> Lifecycle<'a, S> {
  pub fn new(store: &'a S, area: &'a FeatureArea) -> Self { Self { store, area } }

  pub fn area(&self) -> &FeatureArea { self.area }

  /// Validate and persist a new submission in the live collection of its
  /// category. A blank category falls back to the area default.
  pub async fn submit(&self, mut input: NewRecord) -> Result<Record> {
    if input.category.trim().is_empty() {
      input.category = self.area.default_category.clone();
    }
    self.area.validate_category(&input.category)?;
    if let Some(key) = input.reserved_keys().next() {
      return Err(Error::ValidationFailed(format!("field {key:?} is reserved")));
    }
    for field in &self.area.required_fields {
      let present = input
        .fields
        .get(field)
        .is_some_and(|v| v.as_str().map_or(!v.is_null(), |s| !s.trim().is_empty()));
      if !present {
        return Err(Error::ValidationFailed(format!("field {field:?} is required")));
      }
    }
    if input.status == Some(Status::Archived) {
      return Err(Error::ValidationFailed("new records cannot be archived".into()));
    }

    let collection = self.area.live_collection(&input.category);
    let record = self
      .store
      .create(collection, input)
      .await
      .map_err(Error::store)?;
    tracing::info!(area = %self.area.name, id = %record.id, collection, "record submitted");
    Ok(record)
  }

  /// Find a record among the area's live collections, then its archive.
  pub async fn locate(&self, id: Uuid) -> Result<Option<(Location, Record)>> {
    for collection in self.area.live_collections() {
      if let Some(record) = self.store.get(collection, id).await.map_err(Error::store)? {
        return Ok(Some((live(collection), record)));
      }
    }
    let archive = &self.area.archive_collection;
    Ok(
      self
        .store
        .get(archive, id)
        .await
        .map_err(Error::store)?
        .map(|record| (archived(archive), record)),
    )
  }

  /// Apply one transition on behalf of `actor`, with an optional operator
  /// note recorded on the history entry.
  ///
  /// Archiving an archived record (or unarchiving a live one) is
  /// [`Error::NotFound`]: the record is not where the transition expects it,
  /// and nothing is written.
  pub async fn apply(
    &self,
    id: Uuid,
    transition: &Transition,
    actor: &Actor,
    note: Option<String>,
  ) -> Result<TransitionOutcome> {
    let (from, current) = self.locate(id).await?.ok_or(Error::NotFound(id))?;

    let outcome = match transition {
      Transition::Resolve => {
        if from.archived {
          return Err(Error::NotFound(id));
        }
        if current.status != Status::Pending {
          return Err(invalid(current.status, transition));
        }
        let entry = HistoryEntry::new(actor, "marcado como respondido", note);
        let patch = RecordPatch {
          status: Some(Status::Resolved),
          push_history: Some(entry),
          ..RecordPatch::default()
        };
        let record = self.update(&from.collection, id, patch).await?;
        TransitionOutcome { record, to: from.clone(), from }
      }

      Transition::Archive => {
        if from.archived {
          return Err(Error::NotFound(id));
        }
        if current.status.is_archived() {
          return Err(invalid(current.status, transition));
        }
        let entry = HistoryEntry::new(actor, "arquivado", note);
        let to = archived(&self.area.archive_collection);
        let record = self
          .relocate(&from.collection, &to.collection, id, move |mut r| {
            r.previous_status = Some(r.status);
            r.status = Status::Archived;
            r.archived_at = Some(Utc::now());
            r.history.push(entry);
            r
          })
          .await?;
        TransitionOutcome { record, from, to }
      }

      Transition::Unarchive => {
        if !from.archived {
          return Err(Error::NotFound(id));
        }
        let entry = HistoryEntry::new(actor, "desarquivado", note);
        let to = live(self.area.live_collection(&current.category));
        let record = self
          .relocate(&from.collection, &to.collection, id, move |mut r| {
            r.status = r.previous_status.take().unwrap_or_default();
            r.archived_at = None;
            r.history.push(entry);
            r
          })
          .await?;
        TransitionOutcome { record, from, to }
      }

      Transition::Migrate { to: category } => {
        if from.archived {
          return Err(Error::NotFound(id));
        }
        self.area.validate_category(category)?;
        if *category == current.category {
          return Err(Error::ValidationFailed(format!(
            "record is already in category {category:?}"
          )));
        }
        let entry = HistoryEntry::new(
          actor,
          format!("migrado de {} para {}", current.category, category),
          note,
        );
        let to = live(self.area.live_collection(category));
        let record = if to.collection == from.collection {
          let patch = RecordPatch {
            category: Some(category.clone()),
            push_history: Some(entry),
            ..RecordPatch::default()
          };
          self.update(&from.collection, id, patch).await?
        } else {
          let category = category.clone();
          self
            .relocate(&from.collection, &to.collection, id, move |mut r| {
              r.category = category;
              r.history.push(entry);
              r
            })
            .await?
        };
        TransitionOutcome { record, from, to }
      }
    };

    tracing::info!(
      area = %self.area.name,
      %id,
      %transition,
      actor = actor.label(),
      from = %outcome.from.collection,
      to = %outcome.to.collection,
      "record transitioned",
    );
    Ok(outcome)
  }

  /// Apply `transition` to each id in order, stopping at the first failure.
  /// Later ids are reported as skipped and left untouched.
  pub async fn apply_many(
    &self,
    ids: &[Uuid],
    transition: &Transition,
    actor: &Actor,
    note: Option<String>,
  ) -> BulkReport {
    let mut report = BulkReport::default();
    let mut failed = false;
    for &id in ids {
      if failed {
        report.items.push(BulkItem::Skipped { id });
        continue;
      }
      match self.apply(id, transition, actor, note.clone()).await {
        Ok(outcome) => report.items.push(BulkItem::Done { outcome }),
        Err(e) => {
          tracing::warn!(area = %self.area.name, %id, %transition, error = %e, "bulk transition stopped");
          report.items.push(BulkItem::Failed { id, error: e.to_string() });
          failed = true;
        }
      }
    }
    report
  }

  async fn update(&self, collection: &str, id: Uuid, patch: RecordPatch) -> Result<Record> {
    self
      .store
      .update(collection, id, patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))
  }

  async fn relocate<F>(&self, source: &str, dest: &str, id: Uuid, transform: F) -> Result<Record>
  where
    F: FnOnce(Record) -> Record + Send + 'static,
  {
    self
      .store
      .move_record(source, dest, id, transform)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))
  }
}

fn live(collection: &str) -> Location {
  Location { collection: collection.to_owned(), archived: false }
}

fn archived(collection: &str) -> Location {
  Location { collection: collection.to_owned(), archived: true }
}

fn invalid(from: Status, transition: &Transition) -> Error {
  Error::InvalidTransition { from, transition: transition.clone() }
}
