//! Object storage endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/uploads/{turma_id}/{filename}` | Raw body; returns 201 + [`StoredObject`] |
//! | `GET`  | `/files/{*key}` | Download |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use dtaxi_core::store::{ObjectStore, RecordStore, StoredObject, upload_key};

use crate::{ApiState, error::ApiError};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// `PUT /uploads/{turma_id}/{filename}`
pub async fn upload<S>(
  State(state): State<ApiState<S>>,
  Path((turma_id, filename)): Path<(String, String)>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<(StatusCode, Json<StoredObject>), ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let key = upload_key(&turma_id, &filename)?;
  if body.is_empty() {
    return Err(ApiError::BadRequest("empty upload".into()));
  }
  let content_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or(DEFAULT_CONTENT_TYPE);

  let stored = state
    .store
    .put_object(&key, content_type, body.to_vec())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /files/{*key}`
pub async fn download<S>(
  State(state): State<ApiState<S>>,
  Path(key): Path<String>,
) -> Result<Response, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let (content_type, bytes) = state
    .store
    .get_object(&key)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("file {key} not found")))?;
  Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
