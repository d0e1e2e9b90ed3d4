//! [`generate_annual_report`]: fetch one year of records and reduce them.
//!
//! Fetching happens first and in full; every derived figure is then computed
//! from the in-memory snapshot. A fetch failure aborts the whole report.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Month};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
  ANONYMOUS, ActiveStoryteller, Breakdown, CulturalMetrics, Engagement, Featured, Impact,
  Insights, MonthCount, NONE, ReportDocument, ServiceEffectiveness, Summary, TOP_N, TopStory,
  UNKNOWN_STORYTELLER,
};
use crate::{
  Error, Result,
  period::ReportingPeriod,
  record::{Profile, Story},
  source::RecordSource,
};

/// Build the annual report for `year` from `source`, scoped to
/// `organization_id`.
///
/// Years without stories yield a well-formed, all-zero report.
pub async fn generate_annual_report<S>(
  source: &S,
  organization_id: Uuid,
  year: i32,
) -> Result<ReportDocument>
where
  S: RecordSource,
{
  let period = ReportingPeriod::calendar_year(year)?;
  let prior = period.previous()?;

  let stories = source
    .list_stories(period.filter(organization_id)?)
    .await
    .map_err(Error::backend)?;
  debug!(year, stories = stories.len(), "fetched stories");

  let storyteller_ids = distinct_storytellers(&stories);

  let profiles = if storyteller_ids.is_empty() {
    Vec::new()
  } else {
    source
      .list_profiles(&storyteller_ids)
      .await
      .map_err(Error::backend)?
  };
  debug!(year, profiles = profiles.len(), "fetched profiles");

  let prior_year_total = source
    .count_stories(prior.filter(organization_id)?)
    .await
    .map_err(Error::backend)?;
  debug!(year, prior_year_total, "counted prior-year stories");

  let first_story_dates = if storyteller_ids.is_empty() {
    HashMap::new()
  } else {
    source
      .earliest_story_dates(&storyteller_ids)
      .await
      .map_err(Error::backend)?
  };
  let period_start = period.start_instant();
  let new_storytellers = storyteller_ids
    .iter()
    .filter(|&&id| first_story_dates.get(&id).is_none_or(|first| *first >= period_start))
    .count() as u64;

  let report = assemble(Snapshot {
    period,
    stories: &stories,
    storyteller_ids: &storyteller_ids,
    profiles: &profiles,
    prior_year_total,
    new_storytellers,
  });

  info!(
    year,
    total_stories = report.summary.total_stories,
    total_storytellers = report.summary.total_storytellers,
    growth_rate = report.insights.growth_rate,
    "generated annual report"
  );

  Ok(report)
}

/// Sum of counters, pinned at `u64::MAX` instead of wrapping.
fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
  values.fold(0, u64::saturating_add)
}

/// Storyteller ids in first-encounter order, without repeats.
fn distinct_storytellers(stories: &[Story]) -> Vec<Uuid> {
  let mut seen = HashSet::new();
  stories
    .iter()
    .filter_map(|s| s.storyteller_id)
    .filter(|id| seen.insert(*id))
    .collect()
}

// ─── Pure reduction ──────────────────────────────────────────────────────────

/// Everything fetched for one report.
struct Snapshot<'a> {
  period:           ReportingPeriod,
  stories:          &'a [Story],
  storyteller_ids:  &'a [Uuid],
  profiles:         &'a [Profile],
  prior_year_total: u64,
  new_storytellers: u64,
}

fn assemble(snap: Snapshot<'_>) -> ReportDocument {
  let stories = snap.stories;
  let profiles_by_id: HashMap<Uuid, &Profile> =
    snap.profiles.iter().map(|p| (p.id, p)).collect();

  let total_stories = stories.len() as u64;
  let total_storytellers = snap.storyteller_ids.len() as u64;
  let total_people_affected = saturating_total(stories.iter().map(Story::people_affected_or_zero));

  let summary = Summary {
    total_stories,
    total_storytellers,
    total_elders: snap.profiles.iter().filter(|p| p.is_elder).count() as u64,
    total_youth: snap.profiles.iter().filter(|p| p.is_youth()).count() as u64,
    total_people_affected,
    total_views: saturating_total(stories.iter().map(Story::views_or_zero)),
    total_shares: saturating_total(stories.iter().map(Story::shares_or_zero)),
  };

  let stories_by_category: Breakdown = stories.iter().map(Story::category_or_default).collect();
  let stories_by_type: Breakdown = stories.iter().map(Story::story_type_or_default).collect();
  let stories_by_service: Breakdown =
    stories.iter().filter_map(|s| s.related_service.as_deref()).collect();
  let stories_by_month = month_counts(stories);

  let cultural_metrics = CulturalMetrics {
    traditional_knowledge_stories: stories
      .iter()
      .filter(|s| s.contains_traditional_knowledge)
      .count() as u64,
    elder_wisdom_stories: stories.iter().filter(|s| s.is_elder_wisdom()).count() as u64,
    cultural_sensitivity_breakdown: stories.iter().map(Story::sensitivity_or_default).collect(),
  };

  let engagement = Engagement {
    active_storytellers: total_storytellers,
    new_storytellers: snap.new_storytellers,
    average_stories_per_storyteller: ratio(total_stories, total_storytellers),
    most_active_storytellers: most_active(stories, &profiles_by_id),
  };

  let service_effectiveness = service_effectiveness(stories, &stories_by_service);
  let impact = Impact {
    total_people_affected,
    impact_by_type: stories
      .iter()
      .flat_map(|s| s.impact_type.iter().map(String::as_str))
      .collect(),
    service_effectiveness,
  };

  let most_engaged_category = stories_by_category.most_common().unwrap_or(NONE).to_owned();
  let featured = Featured {
    top_stories: top_stories(stories, &profiles_by_id),
    most_engaged_category: most_engaged_category.clone(),
    most_impactful_service: impact
      .service_effectiveness
      .first()
      .map_or_else(|| NONE.to_owned(), |s| s.service.clone()),
  };

  let stories_with_impact = stories.iter().filter(|s| s.has_impact()).count() as u64;
  let insights = Insights {
    growth_rate: growth_rate(total_stories, snap.prior_year_total),
    most_common_category: most_engaged_category,
    peak_month: peak_month(&stories_by_month),
    average_impact_per_story: ratio(total_people_affected, stories_with_impact),
  };

  ReportDocument {
    year: snap.period.year(),
    report_period: snap.period,
    summary,
    stories_by_category,
    stories_by_type,
    stories_by_service,
    stories_by_month,
    cultural_metrics,
    engagement,
    impact,
    featured,
    insights,
  }
}

/// `numerator / denominator`, or zero when the denominator is zero.
fn ratio(numerator: u64, denominator: u64) -> f64 {
  if denominator == 0 {
    0.0
  } else {
    numerator as f64 / denominator as f64
  }
}

fn growth_rate(total: u64, prior_year_total: u64) -> f64 {
  if prior_year_total == 0 {
    return 0.0;
  }
  (total as f64 - prior_year_total as f64) / prior_year_total as f64 * 100.0
}

/// Twelve buckets keyed on the UTC month of `created_at`.
fn month_counts(stories: &[Story]) -> Vec<MonthCount> {
  let mut counts = [0u64; 12];
  for story in stories {
    counts[story.created_at.month0() as usize] += 1;
  }
  std::iter::successors(Some(Month::January), |m| Some(m.succ()))
    .zip(counts)
    .map(|(month, count)| MonthCount { month: month.name().to_owned(), count })
    .collect()
}

/// The earliest month holding the maximum count.
fn peak_month(months: &[MonthCount]) -> String {
  let mut peak: Option<&MonthCount> = None;
  for m in months {
    if peak.is_none_or(|p| m.count > p.count) {
      peak = Some(m);
    }
  }
  peak.map(|m| m.month.clone()).unwrap_or_default()
}

/// Top storytellers by story count. `sort_by` is stable, so equal counts
/// keep the order in which each storyteller first appeared.
fn most_active(
  stories: &[Story],
  profiles_by_id: &HashMap<Uuid, &Profile>,
) -> Vec<ActiveStoryteller> {
  let mut counts: Vec<(Uuid, u64)> = Vec::new();
  let mut index: HashMap<Uuid, usize> = HashMap::new();
  for id in stories.iter().filter_map(|s| s.storyteller_id) {
    match index.get(&id) {
      Some(&i) => counts[i].1 += 1,
      None => {
        index.insert(id, counts.len());
        counts.push((id, 1));
      }
    }
  }

  counts.sort_by(|a, b| b.1.cmp(&a.1));
  counts
    .into_iter()
    .take(TOP_N)
    .map(|(id, story_count)| ActiveStoryteller {
      storyteller_id: id,
      name: profiles_by_id
        .get(&id)
        .and_then(|p| p.display_name())
        .unwrap_or(UNKNOWN_STORYTELLER)
        .to_owned(),
      story_count,
    })
    .collect()
}

fn service_effectiveness(
  stories: &[Story],
  stories_by_service: &Breakdown,
) -> Vec<ServiceEffectiveness> {
  let mut ranking: Vec<ServiceEffectiveness> = stories_by_service
    .iter()
    .map(|(service, story_count)| ServiceEffectiveness {
      service: service.to_owned(),
      story_count,
      people_affected: saturating_total(
        stories
          .iter()
          .filter(|s| s.related_service.as_deref() == Some(service))
          .map(Story::people_affected_or_zero),
      ),
    })
    .collect();
  ranking.sort_by(|a, b| b.story_count.cmp(&a.story_count));
  ranking
}

/// Most-viewed featurable stories; equal view counts keep query order.
fn top_stories(stories: &[Story], profiles_by_id: &HashMap<Uuid, &Profile>) -> Vec<TopStory> {
  let mut eligible: Vec<&Story> = stories.iter().filter(|s| s.is_featurable()).collect();
  eligible.sort_by(|a, b| b.views_or_zero().cmp(&a.views_or_zero()));
  eligible
    .into_iter()
    .take(TOP_N)
    .map(|story| TopStory {
      id: story.id,
      title: story.title.clone(),
      storyteller_name: story
        .storyteller_id
        .and_then(|id| profiles_by_id.get(&id))
        .and_then(|p| p.display_name())
        .unwrap_or(ANONYMOUS)
        .to_owned(),
      views: story.views_or_zero(),
      category: story.category.clone(),
    })
    .collect()
}
