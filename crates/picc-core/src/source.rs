//! The `RecordSource` and `StoryStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `picc-store-sqlite`).
//! The aggregator only needs [`RecordSource`]; the API and importer also
//! write through [`StoryStore`].

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::record::{NewProfile, NewStory, Profile, Story, earliest_storable, storable_limit};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecordSource::list_stories`] and
/// [`RecordSource::count_stories`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryFilter {
  pub organization_id: Uuid,
  /// Inclusive lower bound on `created_at`.
  pub created_from:    DateTime<Utc>,
  /// Exclusive upper bound on `created_at`.
  pub created_until:   DateTime<Utc>,
}

impl StoryFilter {
  /// Every story of the organization, across the whole storable range.
  pub fn all_time(organization_id: Uuid) -> Self {
    Self {
      organization_id,
      created_from: earliest_storable(),
      created_until: storable_limit(),
    }
  }

  pub fn matches(&self, story: &Story) -> bool {
    story.organization_id == self.organization_id
      && self.created_from <= story.created_at
      && story.created_at < self.created_until
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Read access to stories and profiles.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Stories matching `filter`, ordered by `created_at` and then by insertion
  /// order. Aggregation tie-breaks depend on this order.
  fn list_stories(
    &self,
    filter: StoryFilter,
  ) -> impl Future<Output = Result<Vec<Story>, Self::Error>> + Send + '_;

  /// Profiles with the given ids. Unknown ids are skipped silently.
  fn list_profiles<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + 'a;

  /// Number of stories matching `filter`.
  fn count_stories(
    &self,
    filter: StoryFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Whether the storyteller has any story, in any organization, created
  /// strictly before `before`.
  fn storyteller_has_earlier_story(
    &self,
    storyteller_id: Uuid,
    before: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Earliest `created_at` per storyteller, across all organizations.
  /// Storytellers with no stories are absent from the map.
  fn earliest_story_dates<'a>(
    &'a self,
    storyteller_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<HashMap<Uuid, DateTime<Utc>>, Self::Error>> + Send + 'a;
}

/// A [`RecordSource`] that can also record new stories and profiles.
pub trait StoryStore: RecordSource {
  /// Persist a profile. `created_at` is set by the store. Fails if the id is
  /// already taken.
  fn add_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Persist a story under `organization_id` unless the input names its own.
  ///
  /// Fails if `storyteller_id` does not reference an existing profile, if the
  /// id is already taken, or if `created_at` is outside the storable range.
  fn add_story(
    &self,
    organization_id: Uuid,
    input: NewStory,
  ) -> impl Future<Output = Result<Story, Self::Error>> + Send + '_;

  /// Retrieve a profile by id. Returns `None` if not found.
  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Retrieve a story by id. Returns `None` if not found.
  fn get_story(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + '_;
}
