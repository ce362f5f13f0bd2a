//! Handlers for `/areas` and per-area counts.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/areas` | Configured areas with their categories |
//! | `GET`  | `/areas/{area}/counts` | Tab badge counts plus the archive size |

use axum::{
  Json,
  extract::{Path, State},
};
use dtaxi_core::{
  area::{FeatureArea, Orientation},
  query::TabCounts,
  snapshot::AreaSnapshot,
  store::{ObjectStore, RecordStore},
};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct AreaSummary {
  pub name:             String,
  pub title:            String,
  pub categories:       Vec<String>,
  pub default_category: String,
  pub orientation:      Orientation,
}

impl From<&FeatureArea> for AreaSummary {
  fn from(a: &FeatureArea) -> Self {
    Self {
      name:             a.name.clone(),
      title:            a.title.clone(),
      categories:       a.categories.clone(),
      default_category: a.default_category.clone(),
      orientation:      a.orientation,
    }
  }
}

/// `GET /areas`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Result<Json<Vec<AreaSummary>>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let areas = state
    .areas
    .names()
    .map(|name| state.areas.get(name).map(AreaSummary::from))
    .collect::<Result<_, _>>()?;
  Ok(Json(areas))
}

#[derive(Debug, Serialize)]
pub struct Counts {
  #[serde(flatten)]
  pub tabs:     TabCounts,
  pub archived: usize,
}

/// `GET /areas/{area}/counts`
pub async fn counts<S>(
  State(state): State<ApiState<S>>,
  Path(area): Path<String>,
) -> Result<Json<Counts>, ApiError>
where
  S: RecordStore + ObjectStore + 'static,
{
  let area = state.areas.get(&area)?;
  let snapshot = AreaSnapshot::load(state.store.as_ref(), area).await?;
  Ok(Json(Counts {
    tabs:     snapshot.tab_counts(),
    archived: snapshot.archived().len(),
  }))
}
