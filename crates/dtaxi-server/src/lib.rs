//! The D-TAXI back-office server: configuration, operator authentication
//! and the HTTP stack around [`dtaxi_api`].

pub mod auth;
pub mod error;
pub mod render;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use dtaxi_api::{ApiSettings, ApiState};
use dtaxi_core::store::{ObjectStore, RecordStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, OperatorConfig, authenticate};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DTAXI_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// Public root of the server; download URLs of stored files hang off it.
  pub base_url:          String,
  pub store_path:        PathBuf,
  #[serde(default)]
  pub page_size:         Option<usize>,
  #[serde(default)]
  pub export_chunk_size: Option<usize>,
  /// Program and arguments of the HTML to PDF/PNG renderer.
  #[serde(default)]
  pub renderer_command:  Vec<String>,
  #[serde(default)]
  pub operators:         Vec<OperatorConfig>,
}

impl ServerConfig {
  pub fn api_settings(&self) -> ApiSettings {
    let defaults = ApiSettings::default();
    ApiSettings {
      page_size: self.page_size.filter(|&n| n > 0).unwrap_or(defaults.page_size),
      export_chunk_size: self
        .export_chunk_size
        .filter(|&n| n > 0)
        .unwrap_or(defaults.export_chunk_size),
      ..defaults
    }
  }

  pub fn auth(&self) -> AuthConfig { AuthConfig { operators: self.operators.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API behind operator authentication, with
/// request tracing.
pub fn router<S>(state: ApiState<S>, auth: AuthConfig) -> Router
where
  S: RecordStore + ObjectStore + 'static,
{
  dtaxi_api::api_router(state)
    .layer(middleware::from_fn_with_state(Arc::new(auth), authenticate))
    .layer(TraceLayer::new_for_http())
}
