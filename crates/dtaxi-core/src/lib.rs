//! Core types and trait definitions for the D-TAXI back-office records
//! service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the record model, the store contracts, the pure
//! filter/sort/paginate engine and the lifecycle transition handler that all
//! four feature areas (contact messages, satisfaction surveys, driver praise,
//! coordination documents) share.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod area;
pub mod error;
pub mod lifecycle;
pub mod links;
pub mod query;
pub mod record;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
