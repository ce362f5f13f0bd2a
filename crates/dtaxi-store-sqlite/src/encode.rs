//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps in indexed columns are fixed-width RFC 3339 strings (UTC,
//! microsecond precision) so that lexical order equals time order. UUIDs
//! are stored as hyphenated lowercase strings. Record bodies are the
//! record's own camelCase JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use dtaxi_core::{
  record::Record,
  store::{Direction, OrderBy},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// SQL `ORDER BY` clause for `order`. `submittedAt` uses the indexed column;
/// any other field is read from the body through the JSON path bound as
/// `?2`. Ties fall back to the id so listings are deterministic.
pub fn order_clause(order: Option<&OrderBy>) -> String {
  let Some(order) = order else {
    return "ORDER BY doc_id".to_owned();
  };
  let dir = match order.direction {
    Direction::Asc => "ASC",
    Direction::Desc => "DESC",
  };
  if order.field == "submittedAt" {
    format!("ORDER BY submitted_at {dir}, doc_id {dir}")
  } else {
    format!("ORDER BY json_extract(body, ?2) {dir}, doc_id {dir}")
  }
}

/// JSON path for a top-level document field.
pub fn json_path(field: &str) -> String { format!("$.\"{}\"", field.replace('"', "")) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column values for one `documents` row, ready to bind.
pub struct EncodedDocument {
  pub doc_id:       String,
  pub body:         String,
  pub submitted_at: String,
}

impl EncodedDocument {
  pub fn from_record(record: &Record) -> Result<Self> {
    Ok(Self {
      doc_id:       encode_uuid(record.id),
      body:         serde_json::to_string(record)?,
      submitted_at: encode_dt(record.submitted_at),
    })
  }
}

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub collection: String,
  pub doc_id:     String,
  pub body:       String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      collection: row.get(0)?,
      doc_id:     row.get(1)?,
      body:       row.get(2)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let id = decode_uuid(&self.doc_id)?;
    let record: Record = serde_json::from_str(&self.body)?;
    if record.id != id {
      return Err(Error::Corrupt {
        collection: self.collection,
        id,
        reason: format!("body carries id {}", record.id),
      });
    }
    Ok(record)
  }
}
