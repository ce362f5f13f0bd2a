//! Error types for `dtaxi-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{lifecycle::Transition, record::Status};

#[derive(Debug, Error)]
pub enum Error {
  /// The backing store failed; callers must treat this as "no data yet",
  /// never as "empty".
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("record not found: {0}")]
  NotFound(Uuid),

  #[error("validation failed: {0}")]
  ValidationFailed(String),

  #[error("cannot apply {transition} to a record with status {from}")]
  InvalidTransition { from: Status, transition: Transition },

  #[error("unknown category {category:?} for area {area}")]
  UnknownCategory { area: String, category: String },

  #[error("unknown feature area: {0}")]
  UnknownArea(String),
}

impl Error {
  /// Wrap any backend error as [`Error::StoreUnavailable`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
