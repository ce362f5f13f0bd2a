//! Handlers for `/areas/{area}/records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/areas/{area}/records` | Filtered, sorted page; see [`RecordQuery`] |
//! | `POST` | `/areas/{area}/records` | Body: [`NewRecord`]; returns 201 + stored record |
//! | `GET`  | `/areas/{area}/records/{id}` | Live or archived record with its location |
//! | `GET`  | `/areas/{area}/records/{id}/links` | Reply links; `?channel=email\|whatsapp` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dtaxi_core::{
  Error as CoreError,
  lifecycle::{Lifecycle, Location},
  links::{ContactLinks, mailto_link, whatsapp_link},
  query::Page,
  record::{NewRecord, Record},
  snapshot::AreaSnapshot,
  store::{ObjectStore, RecordStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, params::RecordQuery};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /areas/{area}/records[?text=..][&status=..][&category=..][&page=..]`
///
/// A page past the end is returned empty with the real `total_pages`.
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
  Query(params): Query<RecordQuery>,
) -> Result<Json<Page<Record>>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(&area)?;
  let filter = params.filter()?;
  let page_size = params.page_size(state.settings.page_size)?;
  let snapshot = AreaSnapshot::load(state.store.as_ref(), area).await?;
  let page = snapshot.view(&filter, params.archived, params.page.unwrap_or(1), page_size);
  Ok(Json(page))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /areas/{area}/records`: returns 201 + the stored record.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
  Json(body): Json<NewRecord>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(&area)?;
  let record = Lifecycle::new(state.store.as_ref(), area).submit(body).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Located {
  pub location: Location,
  pub record:   Record,
}

/// `GET /areas/{area}/records/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path((area, id)): Path<(String, Uuid)>,
) -> Result<Json<Located>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(&area)?;
  let (location, record) = Lifecycle::new(state.store.as_ref(), area)
    .locate(id)
    .await?
    .ok_or(CoreError::NotFound(id))?;
  Ok(Json(Located { location, record }))
}

// ─── Links ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Email,
  Whatsapp,
}

#[derive(Debug, Deserialize)]
pub struct LinkParams {
  /// When set, that link is required and its absence is an error.
  pub channel: Option<Channel>,
  pub subject: Option<String>,
}

/// `GET /areas/{area}/records/{id}/links[?channel=whatsapp]`
pub async fn links<S>(
  State(state): State<ApiState<S>>,
  Path((area, id)): Path<(String, Uuid)>,
  Query(params): Query<LinkParams>,
) -> Result<Json<ContactLinks>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(&area)?;
  let (_, record) = Lifecycle::new(state.store.as_ref(), area)
    .locate(id)
    .await?
    .ok_or(CoreError::NotFound(id))?;

  let subject = params
    .subject
    .unwrap_or_else(|| state.settings.reply_subject.clone());
  let links = ContactLinks::for_record(&record, &subject);

  // Surface the builder's own validation error for a required channel.
  match params.channel {
    Some(Channel::Email) if links.email.is_none() => {
      mailto_link(&record.field_text("email").unwrap_or_default(), &subject, "")?;
    }
    Some(Channel::Whatsapp) if links.whatsapp.is_none() => {
      whatsapp_link(&record.field_text("telefone").unwrap_or_default(), "")?;
    }
    _ => {}
  }
  Ok(Json(links))
}
