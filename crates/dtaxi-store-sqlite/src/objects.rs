//! [`ObjectStore`] implementation: uploaded files kept as blobs next to the
//! documents.

use chrono::Utc;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use rusqlite::OptionalExtension as _;
use sha2::{Digest, Sha256};

use dtaxi_core::store::{ObjectStore, StoredObject};

use crate::{Result, SqliteStore, encode::encode_dt};

/// Characters escaped inside one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'`')
  .add(b'{')
  .add(b'}');

/// SHA-256 of `bytes` as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

impl SqliteStore {
  /// Durable download URL for `key`; each path segment is escaped.
  pub fn url_for(&self, key: &str) -> String {
    let path = key
      .split('/')
      .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
      .collect::<Vec<_>>()
      .join("/");
    format!("{}/files/{path}", self.base_url)
  }
}

impl ObjectStore for SqliteStore {
  type Error = crate::Error;

  async fn put_object(
    &self,
    key: &str,
    content_type: &str,
    bytes: Vec<u8>,
  ) -> Result<StoredObject> {
    let object = StoredObject {
      key:          key.to_owned(),
      url:          self.url_for(key),
      content_type: content_type.to_owned(),
      content_hash: content_hash(&bytes),
      size:         bytes.len() as u64,
    };

    let key_str   = object.key.clone();
    let ctype     = object.content_type.clone();
    let hash      = object.content_hash.clone();
    let size      = object.size as i64;
    let stored_at = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO objects (key, content_type, bytes, content_hash, size, stored_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (key) DO UPDATE SET
             content_type = excluded.content_type,
             bytes        = excluded.bytes,
             content_hash = excluded.content_hash,
             size         = excluded.size,
             stored_at    = excluded.stored_at",
          rusqlite::params![key_str, ctype, bytes, hash, size, stored_at],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(key = %object.key, size = object.size, "object stored");
    Ok(object)
  }

  async fn get_object(&self, key: &str) -> Result<Option<(String, Vec<u8>)>> {
    let key = key.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT content_type, bytes FROM objects WHERE key = ?1",
                rusqlite::params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn object_url(&self, key: &str) -> Result<Option<String>> {
    let key_str = key.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM objects WHERE key = ?1",
              rusqlite::params![key_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists.then(|| self.url_for(key)))
  }
}
