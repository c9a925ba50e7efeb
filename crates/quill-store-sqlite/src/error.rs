//! Error type for `quill-store-sqlite`.

use quill_core::store::{StoreError, UniqueKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A write was rolled back because it violated a UNIQUE constraint.
  #[error("unique constraint failed: {0}")]
  Conflict(UniqueKey),
}

impl StoreError for Error {
  fn violated_key(&self) -> Option<UniqueKey> {
    match self {
      Self::Conflict(key) => Some(*key),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
