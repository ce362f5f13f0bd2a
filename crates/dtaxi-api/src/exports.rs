//! Export endpoints. All accept the same filters as the record list plus
//! `hide_sensitive`; PDF and PNG always mask.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/areas/{area}/export.csv` | `;`-delimited |
//! | `GET`  | `/areas/{area}/export.html` | |
//! | `GET`  | `/areas/{area}/export.pdf` | Needs a renderer |
//! | `GET`  | `/areas/{area}/records/{id}/card.png` | Single-record card; needs a renderer |

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use dtaxi_core::{
  Error as CoreError,
  area::FeatureArea,
  lifecycle::Lifecycle,
  record::Record,
  snapshot::AreaSnapshot,
  store::{ObjectStore, RecordStore},
};
use dtaxi_report::{
  DisplaySettings, RenderTarget, Renderer, Report, ReportOptions, build_report, export, to_csv,
  to_html,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, params::RecordQuery};

fn options<S>(state: &ApiState<S>, hide_sensitive: bool) -> ReportOptions {
  ReportOptions {
    hide_sensitive,
    chunk_size: state.settings.export_chunk_size,
    ..ReportOptions::default()
  }
}

fn attachment(content_type: &str, filename: String, body: impl IntoResponse) -> Response {
  (
    [
      (header::CONTENT_TYPE, content_type.to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ],
    body,
  )
    .into_response()
}

/// Filtered and sorted records for an export, plus the area.
async fn selection<'s, S>(
  state: &'s ApiState<S>,
  area: &str,
  params: &RecordQuery,
) -> Result<(&'s FeatureArea, Vec<Record>), ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(area)?;
  let filter = params.filter()?;
  let snapshot = AreaSnapshot::load(state.store.as_ref(), area).await?;
  Ok((area, snapshot.matching(&filter, params.archived)))
}

fn report<S>(state: &ApiState<S>, area: &FeatureArea, records: &[Record], hide: bool) -> Report {
  build_report(records, area, &options(state, hide), Utc::now())
}

/// `GET /areas/{area}/export.csv`
pub async fn csv<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
  Query(params): Query<RecordQuery>,
) -> Result<Response, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let (area, records) = selection(&state, &area, &params).await?;
  let body = to_csv(&report(&state, area, &records, params.hide_sensitive))?;
  Ok(attachment("text/csv; charset=utf-8", format!("{}.csv", area.name), body))
}

/// `GET /areas/{area}/export.html`
pub async fn html<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
  Query(params): Query<RecordQuery>,
) -> Result<Response, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let (area, records) = selection(&state, &area, &params).await?;
  let body = to_html(&report(&state, area, &records, params.hide_sensitive))?;
  Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response())
}

/// `GET /areas/{area}/export.pdf`
pub async fn pdf<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
  Query(params): Query<RecordQuery>,
) -> Result<Response, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let renderer = renderer(&state)?;
  let (area, records) = selection(&state, &area, &params).await?;
  let target = RenderTarget::pdf_for(area);
  let bytes = render(renderer, area.clone(), records, target, options(&state, true)).await?;
  Ok(attachment(target.content_type(), format!("{}.pdf", area.name), bytes))
}

/// `GET /areas/{area}/records/{id}/card.png`
pub async fn card<S>(
  State(state): State<ApiState<S>>,
  Path((area, id)): Path<(String, Uuid)>,
) -> Result<Response, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let renderer = renderer(&state)?;
  let area = state.areas.get(&area)?;
  let (_, record) = Lifecycle::new(state.store.as_ref(), area)
    .locate(id)
    .await?
    .ok_or(CoreError::NotFound(id))?;
  let target = RenderTarget::Png;
  let bytes = render(renderer, area.clone(), vec![record], target, options(&state, true)).await?;
  Ok(attachment(target.content_type(), format!("{id}.png"), bytes))
}

fn renderer<S>(state: &ApiState<S>) -> Result<Arc<dyn Renderer>, ApiError> {
  state
    .renderer
    .clone()
    .ok_or_else(|| ApiError::Unavailable("no renderer is configured".into()))
}

/// Run the blocking renderer off the async runtime.
async fn render(
  renderer: Arc<dyn Renderer>,
  area: FeatureArea,
  records: Vec<Record>,
  target: RenderTarget,
  options: ReportOptions,
) -> Result<Vec<u8>, ApiError> {
  let rendered = tokio::task::spawn_blocking(move || {
    let mut display = DisplaySettings::default();
    export(renderer.as_ref(), &mut display, &area, &records, target, options)
  })
  .await
  .map_err(|e| dtaxi_report::Error::renderer(format!("render task failed: {e}")))??;
  Ok(rendered.bytes)
}
