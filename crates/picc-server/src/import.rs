//! Bulk import of profiles and stories from a JSON bundle.
//!
//! A bundle looks like:
//!
//! ```json
//! { "profiles": [ { "id": "…", "full_name": "…" } ],
//!   "stories":  [ { "title": "…", "storyteller_id": "…", "created_at": "…" } ] }
//! ```
//!
//! Profiles are written first so stories may reference them by id.

use std::path::Path;

use picc_core::{
  record::{NewProfile, NewStory},
  source::StoryStore,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
pub struct Bundle {
  #[serde(default)]
  pub profiles: Vec<NewProfile>,
  #[serde(default)]
  pub stories:  Vec<NewStory>,
}

/// Counts of records written by [`import_bundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
  pub profiles: usize,
  pub stories:  usize,
}

/// Parse a bundle file.
pub async fn read_bundle(path: &Path) -> Result<Bundle> {
  let bytes = tokio::fs::read(path)
    .await
    .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
  Ok(serde_json::from_slice(&bytes)?)
}

/// Write every record in `bundle` to `store`. Stories without an
/// `organization_id` are filed under `organization_id`.
///
/// Stops at the first failing record; records written before it stay.
pub async fn import_bundle<S>(store: &S, organization_id: Uuid, bundle: Bundle) -> Result<ImportSummary>
where
  S: StoryStore,
{
  let mut summary = ImportSummary { profiles: 0, stories: 0 };

  for profile in bundle.profiles {
    let stored = store.add_profile(profile).await.map_err(Error::store)?;
    debug!(profile_id = %stored.id, "imported profile");
    summary.profiles += 1;
  }

  for story in bundle.stories {
    let stored = store
      .add_story(organization_id, story)
      .await
      .map_err(Error::store)?;
    debug!(story_id = %stored.id, "imported story");
    summary.stories += 1;
  }

  info!(profiles = summary.profiles, stories = summary.stories, "import complete");
  Ok(summary)
}
