//! ETag computation for report documents.
//!
//! The ETag is a SHA-256 hash over the report's JSON serialisation. Reports
//! built from unchanged records serialise identically, so repeated requests
//! can be answered with `304 Not Modified`.

use picc_core::ReportDocument;
use sha2::{Digest, Sha256};

/// Compute a quoted ETag for `report`.
pub fn compute_etag(report: &ReportDocument) -> Result<String, serde_json::Error> {
  let bytes = serde_json::to_vec(report)?;
  let hash = Sha256::digest(&bytes);
  Ok(format!("\"{}\"", hex::encode(hash)))
}

/// Whether an `If-None-Match` header value matches `etag`. Accepts `*`, bare
/// or quoted tags, weak validators and comma-separated lists.
pub fn if_none_match(header: &str, etag: &str) -> bool {
  let wanted = strip_etag_quotes(etag);
  header.split(',').map(str::trim).any(|candidate| {
    candidate == "*" || strip_etag_quotes(candidate.trim_start_matches("W/")) == wanted
  })
}

fn strip_etag_quotes(s: &str) -> &str { s.trim().trim_matches('"') }
