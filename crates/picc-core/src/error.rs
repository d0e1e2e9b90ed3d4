//! Error types for `picc-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The year has no representable calendar window.
  #[error("year {0} is outside the supported calendar range")]
  InvalidYear(i32),

  /// A record timestamp falls outside years 0 through 9999.
  #[error("timestamp {0} is outside the storable range (years 0 to 9999)")]
  TimestampOutOfRange(DateTime<Utc>),

  /// The record source failed; the report is abandoned as a whole.
  #[error("record source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn backend<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Source(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
