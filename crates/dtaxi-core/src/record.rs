//! Record types: the generic document tracked by every feature area.
//!
//! A record lives in exactly one collection at a time: its area's live
//! collection (chosen by category) or the area's archive twin. The document
//! form is a flat camelCase JSON map; feature-specific payload fields sit
//! next to the lifecycle fields and are opaque to this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle tag of a record.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
pub enum Status {
  #[default]
  #[serde(rename = "pendente")]
  #[strum(to_string = "pendente")]
  Pending,
  /// Surveys historically used `resolvida`; both spellings are accepted.
  #[serde(rename = "respondido", alias = "resolvida")]
  #[strum(to_string = "respondido", serialize = "resolvida")]
  Resolved,
  #[serde(rename = "arquivado")]
  #[strum(to_string = "arquivado")]
  Archived,
}

impl Status {
  pub fn is_pending(self) -> bool { matches!(self, Self::Pending) }

  pub fn is_archived(self) -> bool { matches!(self, Self::Archived) }
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The identity of whoever triggers a transition, as reported by the
/// authentication provider. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub display_name: Option<String>,
  pub email:        Option<String>,
}

impl Actor {
  /// Label used when no identity is available at all.
  pub const FALLBACK: &'static str = "Usuário";

  pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      display_name: Some(display_name.into()),
      email:        Some(email.into()),
    }
  }

  /// Display name, falling back to email, falling back to `"Usuário"`.
  pub fn label(&self) -> &str {
    non_blank(self.display_name.as_deref())
      .or_else(|| non_blank(self.email.as_deref()))
      .unwrap_or(Self::FALLBACK)
  }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One audit-log item. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub at:     DateTime<Utc>,
  pub actor:  String,
  pub action: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note:   Option<String>,
}

impl HistoryEntry {
  pub fn new(actor: &Actor, action: impl Into<String>, note: Option<String>) -> Self {
    Self {
      at: Utc::now(),
      actor: actor.label().to_owned(),
      action: action.into(),
      note: note.filter(|n| !n.trim().is_empty()),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Document keys owned by the record itself. A payload field under one of
/// these names would be written twice and make the document unreadable.
pub const RESERVED_FIELDS: [&str; 7] =
  ["id", "category", "status", "submittedAt", "archivedAt", "previousStatus", "history"];

pub fn is_reserved_field(key: &str) -> bool { RESERVED_FIELDS.contains(&key) }

/// A message, survey, praise or document, in its stored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
  /// Assigned by the store on creation; reused across collection moves.
  pub id:              Uuid,
  pub category:        String,
  #[serde(default)]
  pub status:          Status,
  pub submitted_at:    DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub archived_at:     Option<DateTime<Utc>>,
  /// Status held before archiving; restored on unarchive.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous_status: Option<Status>,
  #[serde(default)]
  pub history:         Vec<HistoryEntry>,
  /// Feature-specific payload (name, phone, message text, ratings, ...).
  #[serde(flatten)]
  pub fields:          Map<String, Value>,
}

impl Record {
  /// A payload field as text: strings verbatim, other scalars as their JSON
  /// form, `null`/absent as `None`.
  pub fn field_text(&self, key: &str) -> Option<String> {
    match self.fields.get(key)? {
      Value::Null => None,
      Value::String(s) => Some(s.clone()),
      other => Some(other.to_string()),
    }
  }

  /// A payload field as a number; numeric strings (`"4"`, `"4,5"`) count.
  pub fn field_number(&self, key: &str) -> Option<f64> {
    match self.fields.get(key)? {
      Value::Number(n) => n.as_f64(),
      Value::String(s) => s.trim().replace(',', ".").parse().ok(),
      _ => None,
    }
  }

  /// Merge `patch` into this record. Only supplied parts change; the history
  /// entry, if any, is appended.
  pub fn apply_patch(&mut self, patch: RecordPatch) {
    if let Some(status) = patch.status {
      self.status = status;
    }
    if let Some(category) = patch.category {
      self.category = category;
    }
    if let Some(archived_at) = patch.archived_at {
      self.archived_at = archived_at;
    }
    for (key, value) in patch.fields {
      if !is_reserved_field(&key) {
        self.fields.insert(key, value);
      }
    }
    if let Some(entry) = patch.push_history {
      self.history.push(entry);
    }
  }
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::create`]. The id is always assigned
/// by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
  pub category:     String,
  #[serde(default)]
  pub status:       Option<Status>,
  /// Defaults to the time of creation.
  #[serde(default)]
  pub submitted_at: Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub fields:       Map<String, Value>,
}

impl NewRecord {
  pub fn new(category: impl Into<String>) -> Self {
    Self { category: category.into(), ..Self::default() }
  }

  /// Builder-style payload setter.
  pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.fields.insert(key.into(), value.into());
    self
  }

  /// Payload keys that collide with [`RESERVED_FIELDS`].
  pub fn reserved_keys(&self) -> impl Iterator<Item = &str> {
    self.fields.keys().map(String::as_str).filter(|k| is_reserved_field(k))
  }

  /// Materialise the stored form with a store-assigned `id`. Payload keys
  /// that collide with [`RESERVED_FIELDS`] are dropped.
  pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> Record {
    let mut fields = self.fields;
    fields.retain(|key, _| !is_reserved_field(key));
    Record {
      id,
      category: self.category,
      status: self.status.unwrap_or_default(),
      submitted_at: self.submitted_at.unwrap_or(now),
      archived_at: None,
      previous_status: None,
      history: Vec::new(),
      fields,
    }
  }
}

// ─── RecordPatch ─────────────────────────────────────────────────────────────

/// Partial update for [`crate::store::RecordStore::update`].
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
  pub status:       Option<Status>,
  pub category:     Option<String>,
  /// `Some(None)` clears the archive timestamp.
  pub archived_at:  Option<Option<DateTime<Utc>>>,
  pub fields:       Map<String, Value>,
  /// Appended to `history`; existing entries are never touched.
  pub push_history: Option<HistoryEntry>,
}
