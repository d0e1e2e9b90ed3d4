//! Handlers for `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/profiles` | Body: [`NewProfile`]; returns 201 + stored profile |
//! | `GET`  | `/profiles/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use picc_core::{
  record::{NewProfile, Profile},
  source::StoryStore,
};
use tracing::info;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `POST /profiles`: returns 201 + the stored [`Profile`], or 409 when a
/// caller-supplied id is already taken.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewProfile>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StoryStore + 'static,
{
  if let Some(id) = body.id
    && state
      .store
      .get_profile(id)
      .await
      .map_err(ApiError::store)?
      .is_some()
  {
    return Err(ApiError::Conflict(format!("profile {id} already exists")));
  }

  let profile = state
    .store
    .add_profile(body)
    .await
    .map_err(ApiError::store)?;
  info!(profile_id = %profile.id, "recorded profile");
  Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /profiles/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: StoryStore + 'static,
{
  let profile = state
    .store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}
