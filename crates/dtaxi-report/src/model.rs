//! The report tree: what an export shows, before any output format.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dtaxi_core::{
  area::{ColumnKey, FeatureArea, Orientation},
  query,
  record::{Record, Status},
};
use serde::Serialize;

use crate::mask::{DEFAULT_VISIBLE, mask};

/// Rows per report page.
pub const CHUNK_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub struct ReportOptions {
  pub hide_sensitive: bool,
  pub chunk_size:     usize,
  /// Trailing characters left visible by [`mask`].
  pub mask_visible:   usize,
}

impl Default for ReportOptions {
  fn default() -> Self {
    Self {
      hide_sensitive: false,
      chunk_size:     CHUNK_SIZE,
      mask_visible:   DEFAULT_VISIBLE,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
  pub title:        String,
  pub area:         String,
  pub generated_at: DateTime<Utc>,
  pub orientation:  Orientation,
  pub columns:      Vec<String>,
  pub summary:      Summary,
  pub chunks:       Vec<Chunk>,
}

impl Report {
  pub fn rows(&self) -> impl Iterator<Item = &Vec<String>> {
    self.chunks.iter().flat_map(|c| c.rows.iter())
  }
}

/// Totals over the whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
  pub count:         usize,
  pub average_score: Option<f64>,
  pub by_status:     BTreeMap<Status, usize>,
  pub by_category:   BTreeMap<String, usize>,
}

/// One page of rows with its own totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
  /// 1-based.
  pub number:        usize,
  pub rows:          Vec<Vec<String>>,
  pub count:         usize,
  pub average_score: Option<f64>,
}

/// Build the report for `records`, in the order given.
pub fn build_report(
  records: &[Record],
  area: &FeatureArea,
  options: &ReportOptions,
  now: DateTime<Utc>,
) -> Report {
  let mut by_status = BTreeMap::new();
  let mut by_category = BTreeMap::new();
  for r in records {
    *by_status.entry(r.status).or_insert(0) += 1;
    *by_category.entry(r.category.clone()).or_insert(0) += 1;
  }

  let chunks = records
    .chunks(options.chunk_size.max(1))
    .enumerate()
    .map(|(i, chunk)| Chunk {
      number:        i + 1,
      rows:          chunk.iter().map(|r| row(r, area, options)).collect(),
      count:         chunk.len(),
      average_score: average_score(chunk, area),
    })
    .collect();

  Report {
    title: area.title.clone(),
    area: area.name.clone(),
    generated_at: now,
    orientation: area.orientation,
    columns: area.columns.iter().map(|c| c.label.clone()).collect(),
    summary: Summary {
      count: records.len(),
      average_score: average_score(records, area),
      by_status,
      by_category,
    },
    chunks,
  }
}

fn average_score(records: &[Record], area: &FeatureArea) -> Option<f64> {
  let scores: Vec<f64> = records.iter().filter_map(|r| query::score(r, area)).collect();
  (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
}

fn row(record: &Record, area: &FeatureArea, options: &ReportOptions) -> Vec<String> {
  area
    .columns
    .iter()
    .map(|column| match &column.key {
      ColumnKey::SubmittedAt => record.submitted_at.format("%d/%m/%Y %H:%M").to_string(),
      ColumnKey::Status => record.status.to_string(),
      ColumnKey::Category => record.category.clone(),
      ColumnKey::Score => query::score(record, area)
        .map(format_score)
        .unwrap_or_default(),
      ColumnKey::Field(name) => {
        let value = record.field_text(name).unwrap_or_default();
        if options.hide_sensitive && area.is_sensitive(name) {
          mask(&value, options.mask_visible)
        } else {
          value
        }
      }
    })
    .collect()
}

/// Scores are shown with one decimal and a comma separator.
pub fn format_score(score: f64) -> String { format!("{score:.1}").replace('.', ",") }

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use dtaxi_core::record::NewRecord;
  use uuid::Uuid;

  use super::*;

  fn survey(nome: &str, nota: i64) -> Record {
    NewRecord::new("Pesquisa")
      .with_field("nome", nome)
      .with_field("telefone", "11987654321")
      .with_field("atendimento", nota)
      .with_field("pontualidade", nota)
      .into_record(
        Uuid::new_v4(),
        Utc.with_ymd_and_hms(2024, 2, 10, 9, 30, 0).unwrap(),
      )
  }

  #[test]
  fn splits_into_chunks_of_25_with_own_summaries() {
    let area = FeatureArea::satisfaction_surveys();
    let mut records: Vec<_> = (0..30).map(|_| survey("Ana", 4)).collect();
    records.extend((0..10).map(|_| survey("Rui", 2)));

    let report = build_report(&records, &area, &ReportOptions::default(), Utc::now());
    let sizes: Vec<_> = report.chunks.iter().map(|c| c.count).collect();
    assert_eq!(sizes, [25, 15]);
    assert_eq!(report.chunks[0].average_score, Some(4.0));
    // 5 × 4 + 10 × 2 over 15 rows.
    let second = report.chunks[1].average_score.unwrap();
    assert!((second - 40.0 / 15.0).abs() < 1e-9);
    assert_eq!(report.summary.count, 40);
    assert_eq!(report.summary.by_status[&Status::Pending], 40);
  }

  #[test]
  fn masks_only_sensitive_columns_when_hidden() {
    let area = FeatureArea::satisfaction_surveys();
    let records = [survey("Mariana Souza", 5)];
    let options = ReportOptions { hide_sensitive: true, ..ReportOptions::default() };
    let report = build_report(&records, &area, &options, Utc::now());

    let row = &report.chunks[0].rows[0];
    assert_eq!(row[0], "10/02/2024 09:30");
    assert_eq!(row[1], "M**********za");
    assert_eq!(row[2], "1********21");
    assert_eq!(row[4], "5");
    assert_eq!(row[8], "5,0");

    // The record itself is untouched.
    assert_eq!(records[0].field_text("nome").as_deref(), Some("Mariana Souza"));
  }

  #[test]
  fn empty_record_set() {
    let area = FeatureArea::driver_praise();
    let report = build_report(&[], &area, &ReportOptions::default(), Utc::now());
    assert!(report.chunks.is_empty());
    assert_eq!(report.summary.count, 0);
    assert_eq!(report.summary.average_score, None);
    assert_eq!(report.columns[0], "Data");
  }
}
