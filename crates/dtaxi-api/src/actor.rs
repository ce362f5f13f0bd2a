//! The acting operator of a request.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use dtaxi_core::record::Actor;

/// The [`Actor`] placed in the request extensions by the authentication
/// layer. Requests without one act as the anonymous fallback user.
pub struct Acting(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for Acting {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Acting(parts.extensions.get::<Actor>().cloned().unwrap_or_default()))
  }
}
