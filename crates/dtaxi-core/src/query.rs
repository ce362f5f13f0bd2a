//! The filter/sort/paginate engine.
//!
//! Pure and synchronous: every function here takes the full in-memory record
//! list and returns a derived view of it. No I/O, deterministic for equal
//! inputs.

use std::{cmp::Ordering, collections::BTreeMap, collections::BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  area::FeatureArea,
  record::{Record, Status},
};

/// Page size used by every list view.
pub const DEFAULT_PAGE_SIZE: usize = 20;

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Inclusive range on `submitted_at`; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: Option<DateTime<Utc>>,
  pub end:   Option<DateTime<Utc>>,
}

impl DateRange {
  /// Whole-day range: from the first instant of `from` to the last instant
  /// of `until`.
  pub fn from_dates(from: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
    Self {
      start: from.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
      end:   until.map(|d| {
        let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
        d.and_time(last).and_utc()
      }),
    }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at <= e)
  }

  pub fn is_open(&self) -> bool { self.start.is_none() && self.end.is_none() }
}

/// Inclusive range on the derived score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
  pub min: Option<f64>,
  pub max: Option<f64>,
}

impl ScoreRange {
  pub fn is_open(&self) -> bool { self.min.is_none() && self.max.is_none() }

  /// A record without a score never satisfies an active score bound.
  pub fn contains(&self, score: Option<f64>) -> bool {
    if self.is_open() {
      return true;
    }
    let Some(score) = score else { return false };
    self.min.is_none_or(|m| score >= m) && self.max.is_none_or(|m| score <= m)
  }
}

/// All filter dimensions of a list view. Empty sets and open ranges do not
/// filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
  pub text:       Option<String>,
  pub statuses:   BTreeSet<Status>,
  pub categories: BTreeSet<String>,
  pub submitted:  DateRange,
  pub score:      ScoreRange,
}

impl RecordFilter {
  /// Whether `record` passes every active dimension (AND semantics).
  pub fn matches(&self, record: &Record, area: &FeatureArea) -> bool {
    self.matches_text(record, area)
      && (self.statuses.is_empty() || self.statuses.contains(&record.status))
      && (self.categories.is_empty() || self.categories.contains(&record.category))
      && self.submitted.contains(record.submitted_at)
      && self.score.contains(score(record, area))
  }

  /// Case-insensitive substring match against any searchable field (OR).
  fn matches_text(&self, record: &Record, area: &FeatureArea) -> bool {
    let Some(needle) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
      return true;
    };
    let needle = needle.to_lowercase();
    area
      .searchable_fields
      .iter()
      .filter_map(|f| record.field_text(f))
      .any(|value| value.to_lowercase().contains(&needle))
  }
}

/// Derived score: mean of the area's numeric score fields present on the
/// record.
pub fn score(record: &Record, area: &FeatureArea) -> Option<f64> {
  let values: Vec<f64> = area
    .score_fields
    .iter()
    .filter_map(|f| record.field_number(f))
    .collect();
  if values.is_empty() {
    None
  } else {
    Some(values.iter().sum::<f64>() / values.len() as f64)
  }
}

/// Records satisfying `filter`, in their original order.
pub fn filter(records: &[Record], filter: &RecordFilter, area: &FeatureArea) -> Vec<Record> {
  records
    .iter()
    .filter(|r| filter.matches(r, area))
    .cloned()
    .collect()
}

// ─── Sort ────────────────────────────────────────────────────────────────────

/// Pending records first, then newest submission first. Stable: ties keep
/// their input order.
pub fn sort(records: &mut [Record]) {
  records.sort_by(display_order);
}

fn display_order(a: &Record, b: &Record) -> Ordering {
  b.status
    .is_pending()
    .cmp(&a.status.is_pending())
    .then_with(|| b.submitted_at.cmp(&a.submitted_at))
}

// ─── Paginate ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// 1-based page number that was requested.
  pub page:        usize,
  pub page_size:   usize,
  pub total_items: usize,
  pub total_pages: usize,
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
  len.div_ceil(page_size.max(1))
}

/// Slice page `page_number` (1-based) out of `items`. A page outside
/// `1..=total_pages` is empty; callers clamp with [`clamp_page`].
pub fn page<T: Clone>(items: &[T], page_number: usize, page_size: usize) -> Page<T> {
  let page_size = page_size.max(1);
  let total_pages = total_pages(items.len(), page_size);
  let slice = if page_number == 0 || page_number > total_pages {
    &items[0..0]
  } else {
    let start = (page_number - 1) * page_size;
    let end = (start + page_size).min(items.len());
    &items[start..end]
  };
  Page {
    items: slice.to_vec(),
    page: page_number,
    page_size,
    total_items: items.len(),
    total_pages,
  }
}

/// Clamp a requested page into `1..=total_pages` (page 1 when there are no
/// pages).
pub fn clamp_page(page_number: usize, total_pages: usize) -> usize {
  page_number.clamp(1, total_pages.max(1))
}

/// Filter, sort and paginate in one go. This is what a list view renders.
pub fn view(
  records: &[Record],
  record_filter: &RecordFilter,
  area: &FeatureArea,
  page_number: usize,
  page_size: usize,
) -> Page<Record> {
  let mut matched = filter(records, record_filter, area);
  sort(&mut matched);
  page(&matched, page_number, page_size)
}

// ─── Tab counts ──────────────────────────────────────────────────────────────

/// Badge counts for the "todos" tab and one tab per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCounts {
  pub all:         usize,
  pub by_category: BTreeMap<String, usize>,
}

pub fn tab_counts(records: &[Record], area: &FeatureArea) -> TabCounts {
  let mut counts = TabCounts::default();
  for category in &area.categories {
    counts.by_category.insert(category.clone(), 0);
  }
  for record in records {
    counts.all += 1;
    *counts.by_category.entry(record.category.clone()).or_default() += 1;
  }
  counts
}
