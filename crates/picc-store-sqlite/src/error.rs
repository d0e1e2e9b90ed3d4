//! Error type for `picc-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored integer does not fit the domain type (or vice versa).
  #[error("counter out of range: {0}")]
  OutOfRange(i64),

  /// A record failed domain validation before it was written.
  #[error(transparent)]
  Record(#[from] picc_core::Error),

  /// A caller-supplied id is already taken.
  #[error("duplicate id: {0}")]
  DuplicateId(uuid::Uuid),

  /// A story referenced a storyteller that does not exist.
  #[error("profile not found: {0}")]
  ProfileNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
