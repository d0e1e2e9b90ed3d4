//! JSON REST API for the PICC storytelling platform.
//!
//! Exposes an axum [`Router`] backed by any [`picc_core::source::StoryStore`].
//! Every request is answered within one organization, fixed at construction.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", picc_api::api_router(state))
//! ```

pub mod error;
pub mod etag;
pub mod profiles;
pub mod reports;
pub mod stories;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use picc_core::source::StoryStore;
use uuid::Uuid;

pub use error::ApiError;

/// Deadline applied to report generation when none is configured.
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S: StoryStore> {
  pub store:           Arc<S>,
  /// The organization every read and write is scoped to.
  pub organization_id: Uuid,
  pub report_timeout:  Duration,
}

impl<S: StoryStore> ApiState<S> {
  pub fn new(store: Arc<S>, organization_id: Uuid) -> Self {
    Self { store, organization_id, report_timeout: DEFAULT_REPORT_TIMEOUT }
  }

  pub fn with_report_timeout(mut self, timeout: Duration) -> Self {
    self.report_timeout = timeout;
    self
  }
}

impl<S: StoryStore> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      organization_id: self.organization_id,
      report_timeout:  self.report_timeout,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: StoryStore + 'static,
{
  Router::new()
    // Reports
    .route("/reports/{year}", get(reports::get_one::<S>))
    .route("/reports/{year}/labels", get(reports::labels::<S>))
    // Stories
    .route("/stories", get(stories::list::<S>).post(stories::create::<S>))
    .route("/stories/{id}", get(stories::get_one::<S>))
    // Profiles
    .route("/profiles", post(profiles::create::<S>))
    .route("/profiles/{id}", get(profiles::get_one::<S>))
    .with_state(state)
}
