//! Story and profile records, the inputs to every aggregation.
//!
//! Records come from loosely-typed community submissions, so most fields are
//! optional. Default substitution happens in the accessor methods here rather
//! than at each use site.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Bucket used when a story carries no category.
pub const UNCATEGORIZED: &str = "uncategorized";
/// Bucket used when a story carries no story type.
pub const UNKNOWN_TYPE: &str = "unknown";
/// Sensitivity level assumed when a story does not declare one.
pub const DEFAULT_SENSITIVITY: &str = "low";
/// The story type counted as elder wisdom.
pub const ELDER_WISDOM: &str = "elder_wisdom";
/// The storyteller type counted as youth.
pub const YOUTH: &str = "youth";

// ─── Storable timestamps ─────────────────────────────────────────────────────

/// First instant a record timestamp may hold: `0000-01-01T00:00:00Z`.
pub fn earliest_storable() -> DateTime<Utc> {
  NaiveDate::from_ymd_opt(0, 1, 1)
    .unwrap_or(NaiveDate::MIN)
    .and_time(NaiveTime::MIN)
    .and_utc()
}

/// Exclusive upper bound on record timestamps: the last microsecond of year
/// 9999.
pub fn storable_limit() -> DateTime<Utc> {
  NaiveDate::from_ymd_opt(9999, 12, 31)
    .and_then(|d| d.and_hms_micro_opt(23, 59, 59, 999_999))
    .unwrap_or(NaiveDateTime::MAX)
    .and_utc()
}

/// Reject timestamps outside the four-digit-year range records are kept in.
pub fn check_storable(at: DateTime<Utc>) -> Result<DateTime<Utc>> {
  if earliest_storable() <= at && at < storable_limit() {
    Ok(at)
  } else {
    Err(Error::TimestampOutOfRange(at))
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A person who may author stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:               Uuid,
  pub full_name:        String,
  /// Takes display precedence over `full_name` when present.
  pub preferred_name:   Option<String>,
  /// Free-form, e.g. `community_member`, `elder`, `youth`.
  pub storyteller_type: Option<String>,
  pub is_elder:         bool,
  pub created_at:       DateTime<Utc>,
}

impl Profile {
  /// The preferred name, falling back to the full name. Blank names count as
  /// absent.
  pub fn display_name(&self) -> Option<&str> {
    self
      .preferred_name
      .as_deref()
      .filter(|n| !n.trim().is_empty())
      .or_else(|| Some(self.full_name.as_str()).filter(|n| !n.trim().is_empty()))
  }

  pub fn is_youth(&self) -> bool { self.storyteller_type.as_deref() == Some(YOUTH) }
}

/// Input to [`crate::source::StoryStore::add_profile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
  /// Caller-supplied id; imports use this to keep story references intact.
  #[serde(default)]
  pub id:               Option<Uuid>,
  pub full_name:        String,
  #[serde(default)]
  pub preferred_name:   Option<String>,
  #[serde(default)]
  pub storyteller_type: Option<String>,
  #[serde(default)]
  pub is_elder:         bool,
}

impl NewProfile {
  pub fn new(full_name: impl Into<String>) -> Self {
    Self { full_name: full_name.into(), ..Self::default() }
  }
}

// ─── Story ───────────────────────────────────────────────────────────────────

/// One community-submitted narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
  pub id:                             Uuid,
  pub organization_id:                Uuid,
  /// Absent for anonymous or community-authored stories.
  pub storyteller_id:                 Option<Uuid>,
  pub title:                          String,
  /// Drives year and month bucketing.
  pub created_at:                     DateTime<Utc>,
  pub category:                       Option<String>,
  pub story_type:                     Option<String>,
  pub related_service:                Option<String>,
  pub people_affected:                Option<u64>,
  pub views:                          Option<u64>,
  pub shares:                         Option<u64>,
  pub contains_traditional_knowledge: bool,
  pub cultural_sensitivity_level:     Option<String>,
  /// Impact-category tags; a story counts towards each one.
  pub impact_type:                    Vec<String>,
  /// Only an explicit `false` hides a story from featured content.
  pub is_public:                      Option<bool>,
}

impl Story {
  pub fn category_or_default(&self) -> &str {
    self.category.as_deref().unwrap_or(UNCATEGORIZED)
  }

  pub fn story_type_or_default(&self) -> &str {
    self.story_type.as_deref().unwrap_or(UNKNOWN_TYPE)
  }

  pub fn sensitivity_or_default(&self) -> &str {
    self
      .cultural_sensitivity_level
      .as_deref()
      .unwrap_or(DEFAULT_SENSITIVITY)
  }

  pub fn views_or_zero(&self) -> u64 { self.views.unwrap_or(0) }

  pub fn shares_or_zero(&self) -> u64 { self.shares.unwrap_or(0) }

  pub fn people_affected_or_zero(&self) -> u64 { self.people_affected.unwrap_or(0) }

  /// Whether the story reports a nonzero impact count.
  pub fn has_impact(&self) -> bool { self.people_affected_or_zero() > 0 }

  pub fn is_elder_wisdom(&self) -> bool { self.story_type.as_deref() == Some(ELDER_WISDOM) }

  /// Eligible for featured content unless explicitly marked non-public.
  pub fn is_featurable(&self) -> bool { self.is_public != Some(false) }
}

/// Input to [`crate::source::StoryStore::add_story`].
///
/// `created_at` defaults to now; imports set it to preserve history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStory {
  #[serde(default)]
  pub id:                             Option<Uuid>,
  /// Filled in from the configured scope when absent.
  #[serde(default)]
  pub organization_id:                Option<Uuid>,
  #[serde(default)]
  pub storyteller_id:                 Option<Uuid>,
  pub title:                          String,
  #[serde(default)]
  pub created_at:                     Option<DateTime<Utc>>,
  #[serde(default)]
  pub category:                       Option<String>,
  #[serde(default)]
  pub story_type:                     Option<String>,
  #[serde(default)]
  pub related_service:                Option<String>,
  #[serde(default)]
  pub people_affected:                Option<u64>,
  #[serde(default)]
  pub views:                          Option<u64>,
  #[serde(default)]
  pub shares:                         Option<u64>,
  #[serde(default)]
  pub contains_traditional_knowledge: bool,
  #[serde(default)]
  pub cultural_sensitivity_level:     Option<String>,
  #[serde(default)]
  pub impact_type:                    Vec<String>,
  #[serde(default)]
  pub is_public:                      Option<bool>,
}

impl NewStory {
  /// Convenience constructor with all optional fields unset.
  pub fn new(title: impl Into<String>) -> Self {
    Self { title: title.into(), ..Self::default() }
  }

  /// Check caller-supplied fields before the story is stored.
  pub fn validate(&self) -> Result<()> {
    if let Some(at) = self.created_at {
      check_storable(at)?;
    }
    Ok(())
  }

  /// Build the stored record once the store has settled id, scope and time.
  pub fn into_story(
    self,
    id: Uuid,
    organization_id: Uuid,
    created_at: DateTime<Utc>,
  ) -> Story {
    Story {
      id,
      organization_id,
      storyteller_id: self.storyteller_id,
      title: self.title,
      created_at,
      category: self.category,
      story_type: self.story_type,
      related_service: self.related_service,
      people_affected: self.people_affected,
      views: self.views,
      shares: self.shares,
      contains_traditional_knowledge: self.contains_traditional_knowledge,
      cultural_sensitivity_level: self.cultural_sensitivity_level,
      impact_type: self.impact_type,
      is_public: self.is_public,
    }
  }
}
