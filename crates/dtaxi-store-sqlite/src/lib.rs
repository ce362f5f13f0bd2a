//! SQLite backend for the D-TAXI record and object stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Records are kept as JSON documents
//! keyed by `(collection, id)`; uploaded files live in a blob table.

mod encode;
mod objects;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
