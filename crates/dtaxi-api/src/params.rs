//! Query-string parameters shared by list and export endpoints.
//!
//! `status` and `category` are accepted as comma-separated lists; `from` and
//! `until` are calendar dates (`YYYY-MM-DD`) bounding `submittedAt`
//! inclusively.

use std::str::FromStr;

use chrono::NaiveDate;
use dtaxi_core::{
  query::{DateRange, RecordFilter, ScoreRange},
  record::Status,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
  /// Free text matched against the area's searchable fields.
  pub text:           Option<String>,
  pub status:         Option<String>,
  pub category:       Option<String>,
  pub from:           Option<NaiveDate>,
  pub until:          Option<NaiveDate>,
  pub min_score:      Option<f64>,
  pub max_score:      Option<f64>,
  /// 1-based; defaults to 1.
  pub page:           Option<usize>,
  pub page_size:      Option<usize>,
  /// List the archive instead of the live collections.
  #[serde(default)]
  pub archived:       bool,
  /// Exports only: mask sensitive fields.
  #[serde(default)]
  pub hide_sensitive: bool,
}

impl RecordQuery {
  pub fn filter(&self) -> Result<RecordFilter, ApiError> {
    if let (Some(from), Some(until)) = (self.from, self.until)
      && from > until
    {
      return Err(ApiError::BadRequest(format!("`from` {from} is after `until` {until}")));
    }
    let statuses = split(self.status.as_deref())
      .map(|s| {
        Status::from_str(s).map_err(|_| ApiError::BadRequest(format!("unknown status {s:?}")))
      })
      .collect::<Result<_, _>>()?;

    Ok(RecordFilter {
      text: self.text.clone(),
      statuses,
      categories: split(self.category.as_deref()).map(str::to_owned).collect(),
      submitted: DateRange::from_dates(self.from, self.until),
      score: ScoreRange { min: self.min_score, max: self.max_score },
    })
  }

  pub fn page_size(&self, default: usize) -> Result<usize, ApiError> {
    match self.page_size {
      Some(0) => Err(ApiError::BadRequest("page_size must be positive".into())),
      Some(n) => Ok(n),
      None => Ok(default),
    }
  }
}

fn split(list: Option<&str>) -> impl Iterator<Item = &str> {
  list
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
}
