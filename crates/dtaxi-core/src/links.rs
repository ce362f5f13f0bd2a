//! Outbound contact links for replying to a submitter.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, record::Record};

/// Everything except the RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'.')
  .remove(b'_')
  .remove(b'~');

/// Address part of a `mailto:` URI; `@` separates local part and domain.
const ADDRESS: &AsciiSet = &COMPONENT.remove(b'@');

fn encode(s: &str) -> String { utf8_percent_encode(s, COMPONENT).to_string() }

/// `mailto:` link with a prefilled subject and body. The address is escaped
/// too, so it cannot smuggle in extra header fields.
pub fn mailto_link(email: &str, subject: &str, body: &str) -> Result<String> {
  let email = email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(Error::ValidationFailed(format!("invalid e-mail address {email:?}")));
  }
  Ok(format!(
    "mailto:{}?subject={}&body={}",
    utf8_percent_encode(email, ADDRESS),
    encode(subject),
    encode(body)
  ))
}

/// `wa.me` link with a prefilled message. Only the digits of `phone` are
/// kept.
pub fn whatsapp_link(phone: &str, text: &str) -> Result<String> {
  let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
  if digits.is_empty() {
    return Err(Error::ValidationFailed(format!("invalid phone number {phone:?}")));
  }
  Ok(format!("https://wa.me/{digits}?text={}", encode(text)))
}

/// Reply links available for a record; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLinks {
  pub email:    Option<String>,
  pub whatsapp: Option<String>,
}

impl ContactLinks {
  /// Links built from the record's `email` and `telefone` fields, greeting
  /// the submitter by `nome` when present.
  pub fn for_record(record: &Record, subject: &str) -> Self {
    let greeting = match record.field_text("nome") {
      Some(name) => format!("Olá, {name}!"),
      None => "Olá!".to_owned(),
    };
    Self {
      email:    record
        .field_text("email")
        .and_then(|e| mailto_link(&e, subject, &greeting).ok()),
      whatsapp: record
        .field_text("telefone")
        .and_then(|p| whatsapp_link(&p, &greeting).ok()),
    }
  }
}
