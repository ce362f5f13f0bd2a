//! In-memory record lists for one feature area.
//!
//! An [`AreaSnapshot`] is the single owner of an area's live and archived
//! lists. It is filled by [`AreaSnapshot::load`] and afterwards changed only
//! by transitions that the store has confirmed; the filter engine reads it.

use uuid::Uuid;

use crate::{
  Error, Result,
  area::FeatureArea,
  lifecycle::{BulkReport, Lifecycle, Transition, TransitionOutcome},
  query::{self, Page, RecordFilter, TabCounts},
  record::{Actor, Record},
  store::{ListOptions, RecordStore},
};

#[derive(Debug, Clone)]
pub struct AreaSnapshot {
  area:     FeatureArea,
  live:     Vec<Record>,
  archived: Vec<Record>,
}

impl AreaSnapshot {
  /// Fetch every live collection of `area` and its archive.
  pub async fn load<S: RecordStore>(store: &S, area: &FeatureArea) -> Result<Self> {
    let options = ListOptions::newest_first();
    let mut live = Vec::new();
    for collection in area.live_collections() {
      live.extend(store.list(collection, &options).await.map_err(Error::store)?);
    }
    let archived = store
      .list(&area.archive_collection, &options)
      .await
      .map_err(Error::store)?;
    Ok(Self { area: area.clone(), live, archived })
  }

  pub fn area(&self) -> &FeatureArea { &self.area }

  pub fn live(&self) -> &[Record] { &self.live }

  pub fn archived(&self) -> &[Record] { &self.archived }

  pub fn find(&self, id: Uuid) -> Option<&Record> {
    self.live.iter().chain(&self.archived).find(|r| r.id == id)
  }

  /// Filtered, sorted page of the live or archived list.
  pub fn view(
    &self,
    filter: &RecordFilter,
    archived: bool,
    page: usize,
    page_size: usize,
  ) -> Page<Record> {
    let list = if archived { &self.archived } else { &self.live };
    query::view(list, filter, &self.area, page, page_size)
  }

  /// Filtered and sorted, without pagination (what exports consume).
  pub fn matching(&self, filter: &RecordFilter, archived: bool) -> Vec<Record> {
    let list = if archived { &self.archived } else { &self.live };
    let mut out = query::filter(list, filter, &self.area);
    query::sort(&mut out);
    out
  }

  pub fn tab_counts(&self) -> TabCounts { query::tab_counts(&self.live, &self.area) }

  /// Reflect a confirmed transition without refetching.
  pub fn apply(&mut self, outcome: &TransitionOutcome) {
    let id = outcome.record.id;
    self.live.retain(|r| r.id != id);
    self.archived.retain(|r| r.id != id);
    if outcome.to.archived {
      self.archived.push(outcome.record.clone());
    } else {
      self.live.push(outcome.record.clone());
    }
  }

  /// Run one transition against `store`; the lists change only if it
  /// succeeded.
  pub async fn transition<S: RecordStore>(
    &mut self,
    store: &S,
    id: Uuid,
    transition: &Transition,
    actor: &Actor,
    note: Option<String>,
  ) -> Result<TransitionOutcome> {
    let outcome = Lifecycle::new(store, &self.area)
      .apply(id, transition, actor, note)
      .await?;
    self.apply(&outcome);
    Ok(outcome)
  }

  /// Bulk variant of [`Self::transition`]; completed items are reflected
  /// even when a later one failed.
  pub async fn transition_many<S: RecordStore>(
    &mut self,
    store: &S,
    ids: &[Uuid],
    transition: &Transition,
    actor: &Actor,
    note: Option<String>,
  ) -> BulkReport {
    let report = Lifecycle::new(store, &self.area)
      .apply_many(ids, transition, actor, note)
      .await;
    for outcome in report.outcomes() {
      self.apply(outcome);
    }
    report
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    query::DEFAULT_PAGE_SIZE,
    record::{NewRecord, Status},
    testing::MemoryStore,
  };

  async fn seeded() -> (MemoryStore, FeatureArea, Vec<Uuid>) {
    let store = MemoryStore::default();
    let area = FeatureArea::contact_messages();
    let lc = Lifecycle::new(&store, &area);
    let mut ids = Vec::new();
    for (category, text) in [("Reclamação", "a"), ("Sugestão", "b"), ("Elogio", "c")] {
      let r = lc
        .submit(NewRecord::new(category).with_field("mensagem", text))
        .await
        .unwrap();
      ids.push(r.id);
    }
    (store, area, ids)
  }

  #[tokio::test]
  async fn load_reads_all_live_collections() {
    let (store, area, _) = seeded().await;
    let snap = AreaSnapshot::load(&store, &area).await.unwrap();
    assert_eq!(snap.live().len(), 3);
    assert!(snap.archived().is_empty());
    assert_eq!(snap.tab_counts().by_category["Elogio"], 1);
  }

  #[tokio::test]
  async fn new_submission_shows_on_top_and_in_counts() {
    let (store, area, _) = seeded().await;
    let before = AreaSnapshot::load(&store, &area).await.unwrap().tab_counts();

    let fresh = Lifecycle::new(&store, &area)
      .submit(NewRecord::new("Reclamação").with_field("mensagem", "motorista rude"))
      .await
      .unwrap();

    let snap = AreaSnapshot::load(&store, &area).await.unwrap();
    let after = snap.tab_counts();
    assert_eq!(after.all, before.all + 1);
    assert_eq!(after.by_category["Reclamação"], before.by_category["Reclamação"] + 1);

    let page = snap.view(&RecordFilter::default(), false, 1, DEFAULT_PAGE_SIZE);
    assert_eq!(page.items[0].id, fresh.id);
    assert_eq!(page.items[0].status, Status::Pending);
  }

  #[tokio::test]
  async fn confirmed_transition_updates_lists() {
    let (store, area, ids) = seeded().await;
    let mut snap = AreaSnapshot::load(&store, &area).await.unwrap();

    snap
      .transition(&store, ids[0], &Transition::Archive, &Actor::default(), None)
      .await
      .unwrap();
    assert_eq!(snap.live().len(), 2);
    assert_eq!(snap.archived().len(), 1);
    assert_eq!(snap.find(ids[0]).unwrap().status, Status::Archived);
  }

  #[tokio::test]
  async fn failed_transition_leaves_lists_untouched() {
    let (store, area, ids) = seeded().await;
    let mut snap = AreaSnapshot::load(&store, &area).await.unwrap();
    store.fail_on(ids[1]);

    let result = snap
      .transition(&store, ids[1], &Transition::Archive, &Actor::default(), None)
      .await;
    assert!(result.is_err());
    assert_eq!(snap.live().len(), 3);
    assert!(snap.archived().is_empty());
    assert_eq!(snap.find(ids[1]).unwrap().status, Status::Pending);
  }

  #[tokio::test]
  async fn bulk_reflects_completed_items_only() {
    let (store, area, ids) = seeded().await;
    let mut snap = AreaSnapshot::load(&store, &area).await.unwrap();
    store.fail_on(ids[1]);

    let report = snap
      .transition_many(&store, &ids, &Transition::Archive, &Actor::default(), None)
      .await;
    assert_eq!(report.succeeded(), 1);
    assert_eq!(snap.archived().len(), 1);
    assert_eq!(snap.live().len(), 2);
  }
}
