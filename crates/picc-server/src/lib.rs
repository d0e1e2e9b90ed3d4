//! Server wiring for the PICC storytelling platform.
//!
//! Holds the runtime configuration, the HTTP application builder and the
//! bulk importer used by the `picc-server` binary.

pub mod error;
pub mod import;

pub use error::{Error, Result};

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use axum::Router;
use picc_api::ApiState;
use picc_core::source::StoryStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_report_timeout_secs() -> u64 { 30 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `PICC_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// The organization all reports and writes are scoped to.
  pub organization_id:     Uuid,
  #[serde(default = "default_report_timeout_secs")]
  pub report_timeout_secs: u64,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn report_timeout(&self) -> Duration { Duration::from_secs(self.report_timeout_secs) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full HTTP application: the API router with request tracing.
pub fn app<S>(state: ApiState<S>) -> Router
where
  S: StoryStore + 'static,
{
  picc_api::api_router(state).layer(TraceLayer::new_for_http())
}
