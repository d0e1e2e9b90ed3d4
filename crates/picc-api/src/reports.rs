//! Handlers for `/reports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/:year` | Annual report; honours `If-None-Match` |
//! | `GET`  | `/reports/:year/labels` | Display labels for the report's categories and story types |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use picc_core::{
  ReportDocument,
  format::{format_category_name, format_story_type},
  generate_annual_report,
  source::StoryStore,
};
use serde::Serialize;
use tracing::warn;

use crate::{
  ApiState,
  error::ApiError,
  etag::{compute_etag, if_none_match},
};

/// Run the aggregator under the configured deadline.
async fn generate<S>(state: &ApiState<S>, year: i32) -> Result<ReportDocument, ApiError>
where
  S: StoryStore,
{
  let run = generate_annual_report(state.store.as_ref(), state.organization_id, year);
  match tokio::time::timeout(state.report_timeout, run).await {
    Ok(Ok(report)) => Ok(report),
    Ok(Err(e)) => {
      warn!(year, error = %e, "annual report failed");
      Err(ApiError::from(e))
    }
    Err(_) => {
      warn!(year, timeout = ?state.report_timeout, "annual report timed out");
      Err(ApiError::Timeout)
    }
  }
}

// ─── Report ───────────────────────────────────────────────────────────────────

/// `GET /reports/:year`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(year): Path<i32>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: StoryStore + 'static,
{
  let report = generate(&state, year).await?;
  let etag = compute_etag(&report)?;

  let not_modified = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| if_none_match(v, &etag));

  if not_modified {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }
  Ok(([(header::ETAG, etag)], Json(report)).into_response())
}

// ─── Labels ───────────────────────────────────────────────────────────────────

/// A raw classification key and its display form.
#[derive(Debug, Serialize)]
pub struct Label {
  pub key:   String,
  pub label: String,
}

#[derive(Debug, Serialize)]
pub struct ReportLabels {
  pub categories:  Vec<Label>,
  pub story_types: Vec<Label>,
}

/// `GET /reports/:year/labels`
pub async fn labels<S>(
  State(state): State<ApiState<S>>,
  Path(year): Path<i32>,
) -> Result<Json<ReportLabels>, ApiError>
where
  S: StoryStore + 'static,
{
  let report = generate(&state, year).await?;

  let categories = report
    .stories_by_category
    .keys()
    .map(|key| Label { key: key.to_owned(), label: format_category_name(key) })
    .collect();
  let story_types = report
    .stories_by_type
    .keys()
    .map(|key| Label { key: key.to_owned(), label: format_story_type(key) })
    .collect();

  Ok(Json(ReportLabels { categories, story_types }))
}
