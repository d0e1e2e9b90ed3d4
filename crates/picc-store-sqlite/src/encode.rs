//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order in SQL equals chronological
//! order. Impact tags are stored as a compact JSON array. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use picc_core::record::{Profile, Story};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counters ────────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::OutOfRange(i64::MAX))
}

pub fn decode_count(n: i64) -> Result<u64> { u64::try_from(n).map_err(|_| Error::OutOfRange(n)) }

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> { Ok(serde_json::to_string(tags)?) }

pub fn decode_tags(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawProfile::from_row`].
pub const PROFILE_COLUMNS: &str =
  "profile_id, full_name, preferred_name, storyteller_type, is_elder, created_at";

/// Raw values read directly from a `profiles` row.
pub struct RawProfile {
  pub profile_id:       String,
  pub full_name:        String,
  pub preferred_name:   Option<String>,
  pub storyteller_type: Option<String>,
  pub is_elder:         bool,
  pub created_at:       String,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:       row.get(0)?,
      full_name:        row.get(1)?,
      preferred_name:   row.get(2)?,
      storyteller_type: row.get(3)?,
      is_elder:         row.get(4)?,
      created_at:       row.get(5)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:               decode_uuid(&self.profile_id)?,
      full_name:        self.full_name,
      preferred_name:   self.preferred_name,
      storyteller_type: self.storyteller_type,
      is_elder:         self.is_elder,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawStory::from_row`].
pub const STORY_COLUMNS: &str = "story_id, organization_id, storyteller_id, title, created_at,
   category, story_type, related_service, people_affected, views, shares,
   contains_traditional_knowledge, cultural_sensitivity_level, impact_type, is_public";

/// Raw values read directly from a `stories` row.
pub struct RawStory {
  pub story_id:                       String,
  pub organization_id:                String,
  pub storyteller_id:                 Option<String>,
  pub title:                          String,
  pub created_at:                     String,
  pub category:                       Option<String>,
  pub story_type:                     Option<String>,
  pub related_service:                Option<String>,
  pub people_affected:                Option<i64>,
  pub views:                          Option<i64>,
  pub shares:                         Option<i64>,
  pub contains_traditional_knowledge: bool,
  pub cultural_sensitivity_level:     Option<String>,
  pub impact_type:                    String,
  pub is_public:                      Option<bool>,
}

impl RawStory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      story_id:                       row.get(0)?,
      organization_id:                row.get(1)?,
      storyteller_id:                 row.get(2)?,
      title:                          row.get(3)?,
      created_at:                     row.get(4)?,
      category:                       row.get(5)?,
      story_type:                     row.get(6)?,
      related_service:                row.get(7)?,
      people_affected:                row.get(8)?,
      views:                          row.get(9)?,
      shares:                         row.get(10)?,
      contains_traditional_knowledge: row.get(11)?,
      cultural_sensitivity_level:     row.get(12)?,
      impact_type:                    row.get(13)?,
      is_public:                      row.get(14)?,
    })
  }

  pub fn into_story(self) -> Result<Story> {
    Ok(Story {
      id:                             decode_uuid(&self.story_id)?,
      organization_id:                decode_uuid(&self.organization_id)?,
      storyteller_id:                 self.storyteller_id.as_deref().map(decode_uuid).transpose()?,
      title:                          self.title,
      created_at:                     decode_dt(&self.created_at)?,
      category:                       self.category,
      story_type:                     self.story_type,
      related_service:                self.related_service,
      people_affected:                self.people_affected.map(decode_count).transpose()?,
      views:                          self.views.map(decode_count).transpose()?,
      shares:                         self.shares.map(decode_count).transpose()?,
      contains_traditional_knowledge: self.contains_traditional_knowledge,
      cultural_sensitivity_level:     self.cultural_sensitivity_level,
      impact_type:                    decode_tags(&self.impact_type)?,
      is_public:                      self.is_public,
    })
  }
}
