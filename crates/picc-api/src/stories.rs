//! Handlers for `/stories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stories` | Optional `?year=<year>`; otherwise all stories |
//! | `POST` | `/stories` | Body: [`NewStory`]; returns 201 + stored story |
//! | `GET`  | `/stories/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use picc_core::{
  period::ReportingPeriod,
  record::{NewStory, Story},
  source::{StoryFilter, StoryStore},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Restrict to one calendar year (UTC).
  pub year: Option<i32>,
}

/// `GET /stories[?year=<year>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Story>>, ApiError>
where
  S: StoryStore + 'static,
{
  let filter = match params.year {
    Some(year) => ReportingPeriod::calendar_year(year)?.filter(state.organization_id)?,
    None => StoryFilter::all_time(state.organization_id),
  };

  let stories = state
    .store
    .list_stories(filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stories))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /stories`: returns 201 + the stored [`Story`].
///
/// Stories without an `organization_id` are filed under the configured one.
/// A `created_at` outside years 0 to 9999 is rejected with 400, and a
/// caller-supplied id that is already taken with 409.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewStory>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StoryStore + 'static,
{
  body.validate()?;

  if let Some(id) = body.id
    && state
      .store
      .get_story(id)
      .await
      .map_err(ApiError::store)?
      .is_some()
  {
    return Err(ApiError::Conflict(format!("story {id} already exists")));
  }

  if let Some(teller) = body.storyteller_id {
    state
      .store
      .get_profile(teller)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::NotFound(format!("profile {teller} not found")))?;
  }

  let story = state
    .store
    .add_story(state.organization_id, body)
    .await
    .map_err(ApiError::store)?;
  info!(story_id = %story.id, "recorded story");
  Ok((StatusCode::CREATED, Json(story)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /stories/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Story>, ApiError>
where
  S: StoryStore + 'static,
{
  let story = state
    .store
    .get_story(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("story {id} not found")))?;
  Ok(Json(story))
}
