//! The seam to the external HTML renderer, and the export entry point.

use std::ops::Deref;

use chrono::Utc;
use dtaxi_core::{
  area::{FeatureArea, Orientation},
  record::Record,
};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  html::to_html,
  model::{Report, ReportOptions, build_report},
};

/// What the renderer should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "format")]
pub enum RenderTarget {
  /// A4 document.
  Pdf { orientation: Orientation },
  /// Single image, used for the driver praise card.
  Png,
}

impl RenderTarget {
  pub fn pdf_for(area: &FeatureArea) -> Self { Self::Pdf { orientation: area.orientation } }

  pub fn content_type(self) -> &'static str {
    match self {
      Self::Pdf { .. } => "application/pdf",
      Self::Png => "image/png",
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Pdf { .. } => "pdf",
      Self::Png => "png",
    }
  }
}

/// Opaque HTML to PDF/PNG converter. Failures are reported as
/// [`crate::Error::RendererFailed`].
pub trait Renderer: Send + Sync {
  fn render(&self, html: &str, target: RenderTarget) -> Result<Vec<u8>>;
}

/// Display state shared with whoever shows records on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
  pub hide_sensitive: bool,
}

/// Forces `hide_sensitive` on while alive and restores the previous value
/// when dropped, whether or not the export succeeded.
pub struct HideSensitive<'a> {
  settings: &'a mut DisplaySettings,
  prior:    bool,
}

impl<'a> HideSensitive<'a> {
  pub fn engage(settings: &'a mut DisplaySettings) -> Self {
    let prior = settings.hide_sensitive;
    settings.hide_sensitive = true;
    Self { settings, prior }
  }
}

impl Deref for HideSensitive<'_> {
  type Target = DisplaySettings;

  fn deref(&self) -> &DisplaySettings { self.settings }
}

impl Drop for HideSensitive<'_> {
  fn drop(&mut self) { self.settings.hide_sensitive = self.prior; }
}

/// A rendered export.
#[derive(Debug, Clone)]
pub struct Rendered {
  pub report: Report,
  pub target: RenderTarget,
  pub bytes:  Vec<u8>,
}

/// Render `records` through `renderer` with sensitive fields masked.
///
/// `display.hide_sensitive` reads `true` for the duration of the call and
/// is back to its previous value afterwards, including when the renderer
/// fails.
pub fn export(
  renderer: &dyn Renderer,
  display: &mut DisplaySettings,
  area: &FeatureArea,
  records: &[Record],
  target: RenderTarget,
  options: ReportOptions,
) -> Result<Rendered> {
  let guard = HideSensitive::engage(display);
  let options = ReportOptions { hide_sensitive: guard.hide_sensitive, ..options };
  let report = build_report(records, area, &options, Utc::now());
  let html = to_html(&report)?;

  let bytes = renderer.render(&html, target).inspect_err(|e| {
    tracing::warn!(area = %area.name, format = target.extension(), error = %e, "export failed");
  })?;
  drop(guard);

  tracing::info!(
    area = %area.name,
    format = target.extension(),
    records = records.len(),
    bytes = bytes.len(),
    "export rendered",
  );
  Ok(Rendered { report, target, bytes })
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use dtaxi_core::record::NewRecord;
  use uuid::Uuid;

  use super::*;
  use crate::Error;

  #[derive(Default)]
  struct Capture(Mutex<Vec<String>>);

  impl Renderer for Capture {
    fn render(&self, html: &str, _target: RenderTarget) -> Result<Vec<u8>> {
      self.0.lock().unwrap().push(html.to_owned());
      Ok(b"%PDF".to_vec())
    }
  }

  struct Broken;

  impl Renderer for Broken {
    fn render(&self, _html: &str, _target: RenderTarget) -> Result<Vec<u8>> {
      Err(Error::renderer("canvas exploded"))
    }
  }

  fn praise() -> Vec<Record> {
    vec![
      NewRecord::new("Elogio")
        .with_field("nome", "Fernanda Lima")
        .with_field("telefone", "11912345678")
        .with_field("mensagem", "ótima viagem")
        .into_record(Uuid::new_v4(), Utc::now()),
    ]
  }

  #[test]
  fn export_masks_and_restores_display() {
    let area = FeatureArea::driver_praise();
    let renderer = Capture::default();
    let mut display = DisplaySettings::default();

    let out = export(
      &renderer,
      &mut display,
      &area,
      &praise(),
      RenderTarget::pdf_for(&area),
      ReportOptions::default(),
    )
    .unwrap();

    assert_eq!(out.bytes, b"%PDF");
    assert!(!display.hide_sensitive);
    let html = renderer.0.lock().unwrap().pop().unwrap();
    assert!(!html.contains("Fernanda Lima"));
    assert!(html.contains("F**********ma"));
    assert!(html.contains("ótima viagem"));
  }

  #[test]
  fn renderer_failure_still_restores_display() {
    let area = FeatureArea::driver_praise();
    let mut display = DisplaySettings { hide_sensitive: false };

    let result = export(
      &Broken,
      &mut display,
      &area,
      &praise(),
      RenderTarget::Png,
      ReportOptions::default(),
    );
    assert!(matches!(result, Err(Error::RendererFailed(_))));
    assert!(!display.hide_sensitive);
  }

  #[test]
  fn guard_keeps_an_already_hidden_display_hidden() {
    let mut display = DisplaySettings { hide_sensitive: true };
    {
      let guard = HideSensitive::engage(&mut display);
      assert!(guard.hide_sensitive);
    }
    assert!(display.hide_sensitive);
  }

  #[test]
  fn target_metadata() {
    let area = FeatureArea::contact_messages();
    let target = RenderTarget::pdf_for(&area);
    assert_eq!(target, RenderTarget::Pdf { orientation: Orientation::Landscape });
    assert_eq!(target.content_type(), "application/pdf");
    assert_eq!(RenderTarget::Png.extension(), "png");
  }
}
