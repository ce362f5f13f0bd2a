//! Error types for the report generator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("html generation failed: {0}")]
  Html(String),

  #[error("output is not valid UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),

  /// The external HTML renderer failed or produced nothing.
  #[error("renderer failed: {0}")]
  RendererFailed(String),
}

impl Error {
  pub fn renderer(msg: impl Into<String>) -> Self { Self::RendererFailed(msg.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
