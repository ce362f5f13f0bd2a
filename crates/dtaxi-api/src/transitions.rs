//! Handlers for lifecycle transitions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/areas/{area}/records/{id}/resolve` | pendente → respondido |
//! | `POST` | `/areas/{area}/records/{id}/archive` | moves to the archive |
//! | `POST` | `/areas/{area}/records/{id}/unarchive` | back to the live collection |
//! | `POST` | `/areas/{area}/records/{id}/migrate` | Body needs `category` |
//! | `POST` | `/areas/{area}/bulk/archive` | Body: `{"ids":[..]}`; returns a [`BulkReport`] |
//! | `POST` | `/areas/{area}/bulk/unarchive` | Same as above |
//!
//! Every body accepts an optional `note`, stored on the history entry.

use axum::{
  Json,
  extract::{Path, State},
};
use dtaxi_core::{
  lifecycle::{BulkReport, Lifecycle, Transition, TransitionOutcome},
  store::{ObjectStore, RecordStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, actor::Acting, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct TransitionBody {
  pub note:     Option<String>,
  /// Target category; `migrate` only.
  pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub ids:  Vec<Uuid>,
  pub note: Option<String>,
}

// ─── Single ──────────────────────────────────────────────────────────────────

async fn run<S>(
  state: &ApiState<S>,
  area: &str,
  id: Uuid,
  transition: Transition,
  actor: Acting,
  note: Option<String>,
) -> Result<Json<TransitionOutcome>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(area)?;
  let outcome = Lifecycle::new(state.store.as_ref(), area)
    .apply(id, &transition, &actor.0, note)
    .await?;
  Ok(Json(outcome))
}

fn note(body: Option<Json<TransitionBody>>) -> TransitionBody {
  body.map(|Json(b)| b).unwrap_or_default()
}

/// `POST /areas/{area}/records/{id}/resolve`
pub async fn resolve<S>(
  State(state): State<ApiState<S>>,
  Path((area, id)): Path<(String, Uuid)>,
  actor: Acting,
  body: Option<Json<TransitionBody>>,
) -> Result<Json<TransitionOutcome>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  run(&state, &area, id, Transition::Resolve, actor, note(body).note).await
}

/// `POST /areas/{area}/records/{id}/archive`
pub async fn archive<S>(
  State(state): State<ApiState<S>>,
  Path((area, id)): Path<(String, Uuid)>,
  actor: Acting,
  body: Option<Json<TransitionBody>>,
) -> Result<Json<TransitionOutcome>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  run(&state, &area, id, Transition::Archive, actor, note(body).note).await
}

/// `POST /areas/{area}/records/{id}/unarchive`
pub async fn unarchive<S>(
  State(state): State<ApiState<S>>,
  Path((area, id)): Path<(String, Uuid)>,
  actor: Acting,
  body: Option<Json<TransitionBody>>,
) -> Result<Json<TransitionOutcome>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  run(&state, &area, id, Transition::Unarchive, actor, note(body).note).await
}

/// `POST /areas/{area}/records/{id}/migrate` with `{"category":"Elogio"}`
pub async fn migrate<S>(
  State(state): State<ApiState<S>>,
  Path((area, id)): Path<(String, Uuid)>,
  actor: Acting,
  Json(body): Json<TransitionBody>,
) -> Result<Json<TransitionOutcome>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let to = body
    .category
    .filter(|c| !c.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("`category` is required to migrate".into()))?;
  run(&state, &area, id, Transition::Migrate { to }, actor, body.note).await
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

async fn run_bulk<S>(
  state: &ApiState<S>,
  area: &str,
  transition: Transition,
  actor: Acting,
  body: BulkBody,
) -> Result<Json<BulkReport>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(area)?;
  if body.ids.is_empty() {
    return Err(ApiError::BadRequest("`ids` must not be empty".into()));
  }
  let report = Lifecycle::new(state.store.as_ref(), area)
    .apply_many(&body.ids, &transition, &actor.0, body.note)
    .await;
  Ok(Json(report))
}

/// `POST /areas/{area}/bulk/archive`
pub async fn bulk_archive<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
  actor: Acting,
  Json(body): Json<BulkBody>,
) -> Result<Json<BulkReport>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  run_bulk(&state, &area, Transition::Archive, actor, body).await
}

/// `POST /areas/{area}/bulk/unarchive`
pub async fn bulk_unarchive<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
  actor: Acting,
  Json(body): Json<BulkBody>,
) -> Result<Json<BulkReport>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  run_bulk(&state, &area, Transition::Unarchive, actor, body).await
}
