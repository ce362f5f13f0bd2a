//! SQL schema for the D-TAXI SQLite store.
//!
//! Executed once at connection startup; the version is tracked in
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. A record moved between collections keeps its
-- doc_id; the move is an insert into the destination followed by a delete
-- from the source.
CREATE TABLE IF NOT EXISTS documents (
    collection   TEXT NOT NULL,
    doc_id       TEXT NOT NULL,
    body         TEXT NOT NULL,   -- camelCase JSON of the whole record
    submitted_at TEXT NOT NULL,   -- fixed-width RFC 3339 UTC, sortable
    PRIMARY KEY (collection, doc_id)
);

CREATE INDEX IF NOT EXISTS documents_submitted_idx
    ON documents(collection, submitted_at);

CREATE TABLE IF NOT EXISTS objects (
    key          TEXT PRIMARY KEY,
    content_type TEXT NOT NULL,
    bytes        BLOB NOT NULL,
    content_hash TEXT NOT NULL,   -- SHA-256 hex
    size         INTEGER NOT NULL,
    stored_at    TEXT NOT NULL
);

PRAGMA user_version = 1;
";
