//! Semicolon-delimited CSV output.

use crate::{Result, model::Report};

pub const DELIMITER: u8 = b';';

/// Header row with the column labels, then every row of every chunk.
pub fn to_csv(report: &Report) -> Result<String> {
  let mut writer = csv::WriterBuilder::new()
    .delimiter(DELIMITER)
    .from_writer(Vec::new());
  writer.write_record(&report.columns)?;
  for row in report.rows() {
    writer.write_record(row)?;
  }
  let bytes = writer
    .into_inner()
    .map_err(|e| csv::Error::from(e.into_error()))?;
  Ok(String::from_utf8(bytes)?)
}
