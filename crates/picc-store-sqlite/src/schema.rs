//! SQL schema for the PICC SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    profile_id       TEXT PRIMARY KEY,
    full_name        TEXT NOT NULL,
    preferred_name   TEXT,
    storyteller_type TEXT,             -- free-form; 'youth' is counted separately
    is_elder         INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL     -- fixed-width RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS stories (
    story_id                       TEXT PRIMARY KEY,
    organization_id                TEXT NOT NULL,
    storyteller_id                 TEXT REFERENCES profiles(profile_id),
    title                          TEXT NOT NULL,
    created_at                     TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    category                       TEXT,
    story_type                     TEXT,
    related_service                TEXT,
    people_affected                INTEGER,
    views                          INTEGER,
    shares                         INTEGER,
    contains_traditional_knowledge INTEGER NOT NULL DEFAULT 0,
    cultural_sensitivity_level     TEXT,
    impact_type                    TEXT NOT NULL DEFAULT '[]',  -- JSON array
    is_public                      INTEGER                      -- NULL = unspecified
);

CREATE INDEX IF NOT EXISTS stories_org_created_idx    ON stories(organization_id, created_at);
CREATE INDEX IF NOT EXISTS stories_teller_created_idx ON stories(storyteller_id, created_at);

PRAGMA user_version = 1;
";
