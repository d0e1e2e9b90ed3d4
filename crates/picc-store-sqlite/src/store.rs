//! [`SqliteStore`]: the SQLite implementation of [`RecordSource`] and
//! [`StoryStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use picc_core::{
  record::{NewProfile, NewStory, Profile, Story, check_storable},
  source::{RecordSource, StoryFilter, StoryStore},
};

use crate::{
  Error, Result,
  encode::{
    PROFILE_COLUMNS, RawProfile, RawStory, STORY_COLUMNS, decode_count, decode_dt, decode_uuid,
    encode_count, encode_dt, encode_tags, encode_uuid,
  },
  schema::SCHEMA,
};

/// Bound on `IN (...)` list length per statement; SQLite caps host
/// parameters per statement.
const ID_CHUNK: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A story store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn profile_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM profiles WHERE profile_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

/// The current time at the precision the `created_at` columns keep.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Whether `e` is a primary-key or uniqueness violation.
fn is_duplicate_key(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// `?, ?, ?` with `n` placeholders.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── RecordSource impl ───────────────────────────────────────────────────────

impl RecordSource for SqliteStore {
  type Error = Error;

  async fn list_stories(&self, filter: StoryFilter) -> Result<Vec<Story>> {
    let org_str   = encode_uuid(filter.organization_id);
    let from_str  = encode_dt(filter.created_from);
    let until_str = encode_dt(filter.created_until);

    let raws: Vec<RawStory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STORY_COLUMNS}
           FROM stories
           WHERE organization_id = ?1
             AND created_at >= ?2
             AND created_at <  ?3
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![org_str, from_str, until_str], RawStory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(count = raws.len(), "listed stories");
    raws.into_iter().map(RawStory::into_story).collect()
  }

  async fn list_profiles<'a>(&'a self, ids: &'a [Uuid]) -> Result<Vec<Profile>> {
    let mut profiles = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(ID_CHUNK) {
      let id_strs: Vec<String> = chunk.iter().copied().map(encode_uuid).collect();
      let raws: Vec<RawProfile> = self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id IN ({})",
            placeholders(id_strs.len())
          ))?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(id_strs.iter()), RawProfile::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

      for raw in raws {
        profiles.push(raw.into_profile()?);
      }
    }

    Ok(profiles)
  }

  async fn count_stories(&self, filter: StoryFilter) -> Result<u64> {
    let org_str   = encode_uuid(filter.organization_id);
    let from_str  = encode_dt(filter.created_from);
    let until_str = encode_dt(filter.created_until);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM stories
           WHERE organization_id = ?1
             AND created_at >= ?2
             AND created_at <  ?3",
          rusqlite::params![org_str, from_str, until_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    decode_count(count)
  }

  async fn storyteller_has_earlier_story(
    &self,
    storyteller_id: Uuid,
    before: DateTime<Utc>,
  ) -> Result<bool> {
    let id_str     = encode_uuid(storyteller_id);
    let before_str = encode_dt(before);

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM stories
               WHERE storyteller_id = ?1 AND created_at < ?2
               LIMIT 1",
              rusqlite::params![id_str, before_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(found)
  }

  async fn earliest_story_dates<'a>(
    &'a self,
    storyteller_ids: &'a [Uuid],
  ) -> Result<HashMap<Uuid, DateTime<Utc>>> {
    let mut earliest = HashMap::with_capacity(storyteller_ids.len());

    for chunk in storyteller_ids.chunks(ID_CHUNK) {
      let id_strs: Vec<String> = chunk.iter().copied().map(encode_uuid).collect();
      let rows: Vec<(String, String)> = self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT storyteller_id, MIN(created_at)
             FROM stories
             WHERE storyteller_id IN ({})
             GROUP BY storyteller_id",
            placeholders(id_strs.len())
          ))?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(id_strs.iter()), |row| {
              Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

      for (id, at) in rows {
        earliest.insert(decode_uuid(&id)?, decode_dt(&at)?);
      }
    }

    Ok(earliest)
  }
}

// ─── StoryStore impl ─────────────────────────────────────────────────────────

impl StoryStore for SqliteStore {
  async fn add_profile(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile {
      id:               input.id.unwrap_or_else(Uuid::new_v4),
      full_name:        input.full_name,
      preferred_name:   input.preferred_name,
      storyteller_type: input.storyteller_type,
      is_elder:         input.is_elder,
      created_at:       check_storable(now())?,
    };

    let id_str     = encode_uuid(profile.id);
    let full_name  = profile.full_name.clone();
    let preferred  = profile.preferred_name.clone();
    let kind       = profile.storyteller_type.clone();
    let is_elder   = profile.is_elder;
    let at_str     = encode_dt(profile.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO profiles (
             profile_id, full_name, preferred_name, storyteller_type, is_elder, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, full_name, preferred, kind, is_elder, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_duplicate_key(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateId(profile.id));
    }
    Ok(profile)
  }

  async fn add_story(&self, organization_id: Uuid, input: NewStory) -> Result<Story> {
    if let Some(teller) = input.storyteller_id
      && !self.profile_exists(teller).await?
    {
      return Err(Error::ProfileNotFound(teller));
    }

    let id         = input.id.unwrap_or_else(Uuid::new_v4);
    let org        = input.organization_id.unwrap_or(organization_id);
    let created_at = input.created_at.map_or_else(now, |at| at.trunc_subsecs(6));
    let created_at = check_storable(created_at)?;
    let story      = input.into_story(id, org, created_at);

    let story_id_str   = encode_uuid(story.id);
    let org_str        = encode_uuid(story.organization_id);
    let teller_str     = story.storyteller_id.map(encode_uuid);
    let title          = story.title.clone();
    let at_str         = encode_dt(story.created_at);
    let category       = story.category.clone();
    let story_type     = story.story_type.clone();
    let service        = story.related_service.clone();
    let people         = story.people_affected.map(encode_count).transpose()?;
    let views          = story.views.map(encode_count).transpose()?;
    let shares         = story.shares.map(encode_count).transpose()?;
    let traditional    = story.contains_traditional_knowledge;
    let sensitivity    = story.cultural_sensitivity_level.clone();
    let impact_str     = encode_tags(&story.impact_type)?;
    let is_public      = story.is_public;

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO stories (
             story_id, organization_id, storyteller_id, title, created_at,
             category, story_type, related_service, people_affected, views, shares,
             contains_traditional_knowledge, cultural_sensitivity_level, impact_type, is_public
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
          rusqlite::params![
            story_id_str,
            org_str,
            teller_str,
            title,
            at_str,
            category,
            story_type,
            service,
            people,
            views,
            shares,
            traditional,
            sensitivity,
            impact_str,
            is_public,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_duplicate_key(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateId(story.id));
    }
    Ok(story)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
              rusqlite::params![id_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn get_story(&self, id: Uuid) -> Result<Option<Story>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STORY_COLUMNS} FROM stories WHERE story_id = ?1"),
              rusqlite::params![id_str],
              RawStory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStory::into_story).transpose()
  }
}
