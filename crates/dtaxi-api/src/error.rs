//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use dtaxi_core::Error as CoreError;
use dtaxi_report::Error as ReportError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error(transparent)]
  Report(#[from] ReportError),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A feature that needs a collaborator the server was started without.
  #[error("unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Core(e) => match e {
        CoreError::NotFound(_) | CoreError::UnknownArea(_) => StatusCode::NOT_FOUND,
        CoreError::ValidationFailed(_) | CoreError::UnknownCategory { .. } => {
          StatusCode::BAD_REQUEST
        }
        CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      },
      ApiError::Report(ReportError::RendererFailed(_)) => StatusCode::BAD_GATEWAY,
      ApiError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unavailable(_) | ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
