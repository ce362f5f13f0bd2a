//! JSON REST API for the D-TAXI back office.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`RecordStore`] and [`ObjectStore`]. Authentication, TLS and transport
//! concerns are the caller's responsibility; the acting operator is read
//! from the request extensions (see [`actor::Acting`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dtaxi_api::api_router(state))
//! ```

pub mod actor;
pub mod areas;
pub mod error;
pub mod exports;
pub mod files;
pub mod params;
pub mod records;
pub mod transitions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use dtaxi_core::{
  area::AreaRegistry,
  query::DEFAULT_PAGE_SIZE,
  store::{ObjectStore, RecordStore},
};
use dtaxi_report::{CHUNK_SIZE, Renderer};

pub use error::ApiError;

/// Tunables shared by the handlers.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  pub page_size:         usize,
  pub export_chunk_size: usize,
  /// Subject line of reply e-mails.
  pub reply_subject:     String,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      page_size:         DEFAULT_PAGE_SIZE,
      export_chunk_size: CHUNK_SIZE,
      reply_subject:     "D-TAXI: retorno sobre sua mensagem".into(),
    }
  }
}

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub areas:    Arc<AreaRegistry>,
  pub settings: Arc<ApiSettings>,
  /// PDF/PNG exports answer 503 without one.
  pub renderer: Option<Arc<dyn Renderer>>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, areas: AreaRegistry) -> Self {
    Self {
      store,
      areas: Arc::new(areas),
      settings: Arc::new(ApiSettings::default()),
      renderer: None,
    }
  }

  pub fn with_settings(mut self, settings: ApiSettings) -> Self {
    self.settings = Arc::new(settings);
    self
  }

  pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
    self.renderer = Some(renderer);
    self
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      areas:    self.areas.clone(),
      settings: self.settings.clone(),
      renderer: self.renderer.clone(),
    }
  }
}

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: RecordStore + ObjectStore + 'static,
{
  Router::new()
    // Areas
    .route("/areas", get(areas::list::<S>))
    .route("/areas/{area}/counts", get(areas::counts::<S>))
    // Records
    .route("/areas/{area}/records", get(records::list::<S>).post(records::create::<S>))
    .route("/areas/{area}/records/{id}", get(records::get_one::<S>))
    .route("/areas/{area}/records/{id}/links", get(records::links::<S>))
    // Transitions
    .route("/areas/{area}/records/{id}/resolve", post(transitions::resolve::<S>))
    .route("/areas/{area}/records/{id}/archive", post(transitions::archive::<S>))
    .route("/areas/{area}/records/{id}/unarchive", post(transitions::unarchive::<S>))
    .route("/areas/{area}/records/{id}/migrate", post(transitions::migrate::<S>))
    .route("/areas/{area}/bulk/archive", post(transitions::bulk_archive::<S>))
    .route("/areas/{area}/bulk/unarchive", post(transitions::bulk_unarchive::<S>))
    // Exports
    .route("/areas/{area}/export.csv", get(exports::csv::<S>))
    .route("/areas/{area}/export.html", get(exports::html::<S>))
    .route("/areas/{area}/export.pdf", get(exports::pdf::<S>))
    .route("/areas/{area}/records/{id}/card.png", get(exports::card::<S>))
    // Files
    .route("/uploads/{turma_id}/{filename}", put(files::upload::<S>))
    .route("/files/{*key}", get(files::download::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
