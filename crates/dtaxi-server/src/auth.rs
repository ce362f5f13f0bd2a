//! HTTP Basic authentication of back-office operators.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use dtaxi_core::record::Actor;
use serde::Deserialize;

use crate::error::Error;

/// One operator allowed to use the back office.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub display_name:  Option<String>,
  #[serde(default)]
  pub email:         Option<String>,
}

impl OperatorConfig {
  /// The identity stamped on history entries; the username stands in for a
  /// missing display name.
  pub fn actor(&self) -> Actor {
    Actor {
      display_name: Some(self.display_name.clone().unwrap_or_else(|| self.username.clone())),
      email:        self.email.clone(),
    }
  }
}

/// Credentials accepted by this server instance. Empty means authentication
/// is off.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub operators: Vec<OperatorConfig>,
}

impl AuthConfig {
  pub fn is_enabled(&self) -> bool { !self.operators.is_empty() }
}

/// Find the operator whose Basic credentials are in `headers`.
pub fn verify_operator<'a>(
  headers: &HeaderMap,
  config: &'a AuthConfig,
) -> Result<&'a OperatorConfig, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val.strip_prefix("Basic ").ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let operator = config
    .operators
    .iter()
    .find(|o| o.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&operator.password_hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(operator)
}

/// Middleware: reject unauthenticated requests and put the operator's
/// [`Actor`] into the request extensions.
pub async fn authenticate(
  State(config): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  if config.is_enabled() {
    let operator = verify_operator(req.headers(), &config).inspect_err(|_| {
      tracing::debug!(uri = %req.uri(), "rejected unauthenticated request");
    })?;
    req.extensions_mut().insert(operator.actor());
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::{HeaderValue, header};
  use rand_core::OsRng;

  use super::*;

  fn config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig {
      operators: vec![
        OperatorConfig {
          username:      "marta".into(),
          password_hash: hash,
          display_name:  Some("Marta Coordenadora".into()),
          email:         Some("marta@dtaxi.example".into()),
        },
        OperatorConfig {
          username:      "plantao".into(),
          password_hash: "not-a-phc-string".into(),
          display_name:  None,
          email:         None,
        },
      ],
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    headers(&format!("Basic {}", B64.encode(format!("{user}:{pass}"))))
  }

  #[test]
  fn correct_credentials() {
    let config = config("segredo");
    let operator = verify_operator(&basic("marta", "segredo"), &config).unwrap();
    assert_eq!(operator.actor().label(), "Marta Coordenadora");
  }

  #[test]
  fn wrong_password() {
    let config = config("segredo");
    assert!(matches!(
      verify_operator(&basic("marta", "errado"), &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn unknown_user_and_broken_hash() {
    let config = config("segredo");
    assert!(verify_operator(&basic("joao", "segredo"), &config).is_err());
    assert!(verify_operator(&basic("plantao", "x"), &config).is_err());
  }

  #[test]
  fn missing_or_malformed_header() {
    let config = config("segredo");
    assert!(verify_operator(&HeaderMap::new(), &config).is_err());
    assert!(verify_operator(&headers("Basic !!!not-base64!!!"), &config).is_err());
    assert!(verify_operator(&headers("Bearer abc"), &config).is_err());
  }

  #[test]
  fn username_stands_in_for_display_name() {
    let config = config("segredo");
    assert_eq!(config.operators[1].actor().label(), "plantao");
    assert!(config.is_enabled());
    assert!(!AuthConfig::default().is_enabled());
  }
}
