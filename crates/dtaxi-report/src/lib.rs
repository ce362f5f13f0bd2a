//! Export/report generator for D-TAXI record lists.
//!
//! Turns an already filtered and sorted record list into a [`Report`] tree
//! (chunks of 25 rows with their own mini-summaries), then into CSV, HTML or,
//! through an external [`Renderer`], PDF and PNG. Sensitive fields are
//! masked for display only; records are never modified.

mod csv_export;
mod html;
mod mask;
mod model;
mod render;

pub mod error;

pub use csv_export::{DELIMITER, to_csv};
pub use error::{Error, Result};
pub use html::to_html;
pub use mask::{DEFAULT_VISIBLE, MASK_CHAR, mask};
pub use model::{CHUNK_SIZE, Chunk, Report, ReportOptions, Summary, build_report, format_score};
pub use render::{DisplaySettings, HideSensitive, RenderTarget, Rendered, Renderer, export};
