//! Aggregator tests against an in-memory record source.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use super::{ANONYMOUS, NONE, UNKNOWN_STORYTELLER, generate_annual_report};
use crate::{
  Error,
  record::{NewStory, Profile, Story},
  source::{RecordSource, StoryFilter},
};

// ─── In-memory source ────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("record source unavailable")]
struct Unavailable;

/// The reads a [`MemorySource`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Read {
  Stories,
  Profiles,
  Count,
  EarlierStory,
  EarliestDates,
}

#[derive(Default)]
struct MemorySource {
  stories:  Vec<Story>,
  profiles: Vec<Profile>,
  /// Reads that fail with [`Unavailable`].
  failing:  Vec<Read>,
}

impl MemorySource {
  fn check(&self, read: Read) -> Result<(), Unavailable> {
    if self.failing.contains(&read) { Err(Unavailable) } else { Ok(()) }
  }
}

impl RecordSource for MemorySource {
  type Error = Unavailable;

  async fn list_stories(&self, filter: StoryFilter) -> Result<Vec<Story>, Unavailable> {
    self.check(Read::Stories)?;
    let mut out: Vec<Story> = self.stories.iter().filter(|s| filter.matches(s)).cloned().collect();
    out.sort_by_key(|s| s.created_at);
    Ok(out)
  }

  async fn list_profiles<'a>(&'a self, ids: &'a [Uuid]) -> Result<Vec<Profile>, Unavailable> {
    self.check(Read::Profiles)?;
    Ok(self.profiles.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
  }

  async fn count_stories(&self, filter: StoryFilter) -> Result<u64, Unavailable> {
    self.check(Read::Count)?;
    Ok(self.stories.iter().filter(|s| filter.matches(s)).count() as u64)
  }

  async fn storyteller_has_earlier_story(
    &self,
    storyteller_id: Uuid,
    before: DateTime<Utc>,
  ) -> Result<bool, Unavailable> {
    self.check(Read::EarlierStory)?;
    Ok(
      self
        .stories
        .iter()
        .any(|s| s.storyteller_id == Some(storyteller_id) && s.created_at < before),
    )
  }

  async fn earliest_story_dates<'a>(
    &'a self,
    storyteller_ids: &'a [Uuid],
  ) -> Result<HashMap<Uuid, DateTime<Utc>>, Unavailable> {
    self.check(Read::EarliestDates)?;
    let mut out: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for s in &self.stories {
      if let Some(id) = s.storyteller_id
        && storyteller_ids.contains(&id)
      {
        let entry = out.entry(id).or_insert(s.created_at);
        *entry = (*entry).min(s.created_at);
      }
    }
    Ok(out)
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

fn story(org: Uuid, title: &str, created_at: DateTime<Utc>) -> Story {
  NewStory::new(title).into_story(Uuid::new_v4(), org, created_at)
}

fn profile(name: &str) -> Profile {
  Profile {
    id:               Uuid::new_v4(),
    full_name:        name.into(),
    preferred_name:   None,
    storyteller_type: None,
    is_elder:         false,
    created_at:       at(2020, 1, 1),
  }
}

fn by(mut s: Story, teller: &Profile) -> Story {
  s.storyteller_id = Some(teller.id);
  s
}

// ─── Worked example ──────────────────────────────────────────────────────────

#[tokio::test]
async fn two_story_example() {
  let org = Uuid::new_v4();
  let mut a = profile("Alice");
  a.is_elder = true;
  let mut b = profile("Bob");
  b.storyteller_type = Some("youth".into());

  let mut s1 = by(story(org, "Clinic day", at(2024, 3, 1)), &a);
  s1.category = Some("health".into());
  s1.people_affected = Some(10);
  s1.views = Some(5);
  let mut s2 = by(story(org, "Private yarn", at(2024, 3, 15)), &b);
  s2.views = Some(20);
  s2.is_public = Some(false);

  let src = MemorySource {
    stories: vec![s1.clone(), s2],
    profiles: vec![a, b],
    ..Default::default()
  };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();

  assert_eq!(r.summary.total_stories, 2);
  assert_eq!(r.summary.total_storytellers, 2);
  assert_eq!(r.summary.total_elders, 1);
  assert_eq!(r.summary.total_youth, 1);
  assert_eq!(r.summary.total_people_affected, 10);
  assert_eq!(r.summary.total_views, 25);
  assert_eq!(r.stories_by_category.get("health"), 1);
  assert_eq!(r.stories_by_category.get("uncategorized"), 1);
  assert_eq!(r.stories_by_category.len(), 2);
  assert_eq!(r.stories_by_month[2].month, "March");
  assert_eq!(r.stories_by_month[2].count, 2);
  assert_eq!(r.stories_by_month.iter().map(|m| m.count).sum::<u64>(), 2);
  assert_eq!(r.insights.growth_rate, 0.0);
  assert_eq!(r.insights.average_impact_per_story, 10.0);
  assert_eq!(r.featured.top_stories.len(), 1);
  assert_eq!(r.featured.top_stories[0].id, s1.id);
  assert_eq!(r.featured.top_stories[0].storyteller_name, "Alice");
  assert_eq!(r.report_period.start.to_string(), "2024-01-01");
  assert_eq!(r.report_period.end.to_string(), "2024-12-31");
}

// ─── Shape invariants ────────────────────────────────────────────────────────

#[tokio::test]
async fn totals_agree_across_breakdowns() {
  let org = Uuid::new_v4();
  let categories = [Some("health"), None, Some("culture"), Some("health"), None];
  let stories = categories
    .iter()
    .enumerate()
    .map(|(i, c)| {
      let mut s = story(org, "s", at(2023, (i as u32 * 2) + 1, 10));
      s.category = c.map(Into::into);
      s
    })
    .collect();
  let src = MemorySource { stories, ..Default::default() };

  let r = generate_annual_report(&src, org, 2023).await.unwrap();

  assert_eq!(r.summary.total_stories, 5);
  assert_eq!(r.stories_by_month.iter().map(|m| m.count).sum::<u64>(), 5);
  assert_eq!(r.stories_by_category.total(), 5);
  assert_eq!(r.stories_by_type.total(), 5);
  assert_eq!(r.stories_by_type.get("unknown"), 5);
}

#[tokio::test]
async fn empty_year_is_well_formed() {
  let src = MemorySource::default();
  let r = generate_annual_report(&src, Uuid::new_v4(), 1999).await.unwrap();

  let months: Vec<&str> = r.stories_by_month.iter().map(|m| m.month.as_str()).collect();
  assert_eq!(months, [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
  ]);
  assert!(r.stories_by_month.iter().all(|m| m.count == 0));
  assert_eq!(r.summary.total_stories, 0);
  assert!(r.stories_by_category.is_empty());
  assert!(r.stories_by_type.is_empty());
  assert!(r.stories_by_service.is_empty());
  assert_eq!(r.featured.most_engaged_category, NONE);
  assert_eq!(r.featured.most_impactful_service, NONE);
  assert_eq!(r.insights.most_common_category, NONE);
  assert_eq!(r.insights.peak_month, "January");
  assert_eq!(r.insights.growth_rate, 0.0);
  assert_eq!(r.insights.average_impact_per_story, 0.0);
  assert_eq!(r.engagement.average_stories_per_storyteller, 0.0);
  assert!(r.featured.top_stories.is_empty());
}

#[tokio::test]
async fn year_window_and_scope_are_respected() {
  let org = Uuid::new_v4();
  let other_org = Uuid::new_v4();
  let last_moment = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
  let src = MemorySource {
    stories: vec![
      story(org, "inside", last_moment),
      story(org, "next year", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
      story(org, "first moment", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
      story(other_org, "elsewhere", at(2024, 6, 1)),
    ],
    ..Default::default()
  };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.summary.total_stories, 2);
  assert_eq!(r.stories_by_month[0].count, 1);
  assert_eq!(r.stories_by_month[11].count, 1);
}

// ─── Insights ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn growth_rate_against_prior_year() {
  let org = Uuid::new_v4();
  let mut stories = vec![story(org, "a", at(2023, 2, 1)), story(org, "b", at(2023, 5, 1))];
  stories.extend((0..3).map(|_| story(org, "c", at(2024, 7, 1))));
  let src = MemorySource { stories, ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.insights.growth_rate, 50.0);

  let r = generate_annual_report(&src, org, 2025).await.unwrap();
  assert_eq!(r.insights.growth_rate, -100.0);
}

#[tokio::test]
async fn peak_month_prefers_earliest_on_tie() {
  let org = Uuid::new_v4();
  let src = MemorySource {
    stories: vec![
      story(org, "a", at(2024, 9, 1)),
      story(org, "b", at(2024, 4, 1)),
      story(org, "c", at(2024, 9, 2)),
      story(org, "d", at(2024, 4, 2)),
    ],
    ..Default::default()
  };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.insights.peak_month, "April");
}

#[tokio::test]
async fn average_impact_ignores_stories_without_impact() {
  let org = Uuid::new_v4();
  let mut a = story(org, "a", at(2024, 1, 5));
  a.people_affected = Some(30);
  let mut b = story(org, "b", at(2024, 1, 6));
  b.people_affected = Some(0);
  let mut c = story(org, "c", at(2024, 1, 7));
  c.people_affected = Some(10);
  let d = story(org, "d", at(2024, 1, 8));
  let src = MemorySource { stories: vec![a, b, c, d], ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.impact.total_people_affected, 40);
  assert_eq!(r.insights.average_impact_per_story, 20.0);
}

// ─── Breakdowns and rankings ─────────────────────────────────────────────────

#[tokio::test]
async fn cultural_and_impact_breakdowns() {
  let org = Uuid::new_v4();
  let mut a = story(org, "a", at(2024, 2, 1));
  a.story_type = Some("elder_wisdom".into());
  a.contains_traditional_knowledge = true;
  a.cultural_sensitivity_level = Some("high".into());
  a.impact_type = vec!["health".into(), "culture".into()];
  let mut b = story(org, "b", at(2024, 2, 2));
  b.impact_type = vec!["health".into()];
  let src = MemorySource { stories: vec![a, b], ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.cultural_metrics.traditional_knowledge_stories, 1);
  assert_eq!(r.cultural_metrics.elder_wisdom_stories, 1);
  assert_eq!(r.cultural_metrics.cultural_sensitivity_breakdown.get("high"), 1);
  assert_eq!(r.cultural_metrics.cultural_sensitivity_breakdown.get("low"), 1);
  assert_eq!(r.impact.impact_by_type.get("health"), 2);
  assert_eq!(r.impact.impact_by_type.get("culture"), 1);
  assert_eq!(r.stories_by_type.get("elder_wisdom"), 1);
  assert_eq!(r.stories_by_type.get("unknown"), 1);
}

#[tokio::test]
async fn service_ranking_orders_by_story_count() {
  let org = Uuid::new_v4();
  let mut stories = Vec::new();
  for (i, (service, people)) in [
    (Some("bwgcolman_way"), Some(4)),
    (Some("youth_services"), Some(1)),
    (None, Some(100)),
    (Some("youth_services"), None),
    (Some("youth_services"), Some(6)),
  ]
  .into_iter()
  .enumerate()
  {
    let mut s = story(org, "s", at(2024, 3, i as u32 + 1));
    s.related_service = service.map(Into::into);
    s.people_affected = people;
    stories.push(s);
  }
  let src = MemorySource { stories, ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  let ranking = &r.impact.service_effectiveness;
  assert_eq!(ranking.len(), 2);
  assert_eq!(ranking[0].service, "youth_services");
  assert_eq!(ranking[0].story_count, 3);
  assert_eq!(ranking[0].people_affected, 7);
  assert_eq!(ranking[1].service, "bwgcolman_way");
  assert_eq!(ranking[1].people_affected, 4);
  assert_eq!(r.stories_by_service.total(), 4);
  assert_eq!(r.featured.most_impactful_service, "youth_services");
}

#[tokio::test]
async fn most_active_storytellers_are_stable_on_ties() {
  let org = Uuid::new_v4();
  let first = profile("First");
  let second = profile("Second");
  let third = profile("Third");
  let mut stories = Vec::new();
  let mut day = 1;
  for (teller, n) in [(&third, 3), (&first, 5), (&second, 5)] {
    for _ in 0..n {
      stories.push(by(story(org, "s", at(2024, 1, day)), teller));
      day += 1;
    }
  }
  let src = MemorySource {
    stories,
    profiles: vec![first.clone(), second.clone(), third],
    ..Default::default()
  };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  let top: Vec<(&str, u64)> = r
    .engagement
    .most_active_storytellers
    .iter()
    .map(|a| (a.name.as_str(), a.story_count))
    .collect();
  assert_eq!(top, [("First", 5), ("Second", 5), ("Third", 3)]);
  assert_eq!(r.engagement.most_active_storytellers[0].storyteller_id, first.id);
  assert_eq!(r.engagement.average_stories_per_storyteller, 13.0 / 3.0);
}

#[tokio::test]
async fn rankings_are_capped_at_ten() {
  let org = Uuid::new_v4();
  let tellers: Vec<Profile> = (0..12).map(|i| profile(&format!("Teller {i}"))).collect();
  let stories = tellers
    .iter()
    .enumerate()
    .map(|(i, t)| {
      let mut s = by(story(org, &format!("Story {i}"), at(2024, 5, i as u32 + 1)), t);
      s.views = Some(i as u64);
      s
    })
    .collect();
  let src = MemorySource { stories, profiles: tellers, ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.engagement.most_active_storytellers.len(), 10);
  assert_eq!(r.featured.top_stories.len(), 10);
  assert_eq!(r.featured.top_stories[0].title, "Story 11");
  assert_eq!(r.featured.top_stories[9].title, "Story 2");
}

#[tokio::test]
async fn featured_stories_skip_hidden_and_name_authors() {
  let org = Uuid::new_v4();
  let mut named = profile("Margaret Smith");
  named.preferred_name = Some("Aunty Marg".into());

  let mut hidden = story(org, "hidden", at(2024, 8, 1));
  hidden.views = Some(1_000);
  hidden.is_public = Some(false);
  let mut anon = story(org, "anon", at(2024, 8, 2));
  anon.views = Some(7);
  anon.is_public = Some(true);
  let mut tied = story(org, "tied", at(2024, 8, 3));
  tied.views = Some(7);
  let mut auth = by(story(org, "auth", at(2024, 8, 4)), &named);
  auth.views = Some(50);
  auth.category = Some("culture".into());

  let src = MemorySource {
    stories: vec![hidden, anon, tied, auth],
    profiles: vec![named],
    ..Default::default()
  };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  let titles: Vec<&str> = r.featured.top_stories.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, ["auth", "anon", "tied"]);
  assert_eq!(r.featured.top_stories[0].storyteller_name, "Aunty Marg");
  assert_eq!(r.featured.top_stories[0].category.as_deref(), Some("culture"));
  assert_eq!(r.featured.top_stories[1].storyteller_name, ANONYMOUS);
  assert_eq!(r.featured.top_stories[1].category, None);
}

#[tokio::test]
async fn most_engaged_category_prefers_first_seen_on_tie() {
  let org = Uuid::new_v4();
  let mut stories = Vec::new();
  for (i, c) in ["culture", "health", "health", "culture"].into_iter().enumerate() {
    let mut s = story(org, "s", at(2024, 6, i as u32 + 1));
    s.category = Some(c.into());
    stories.push(s);
  }
  let src = MemorySource { stories, ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.featured.most_engaged_category, "culture");
  assert_eq!(r.insights.most_common_category, "culture");
}

// ─── Storytellers ────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_storytellers_have_no_earlier_story() {
  let org = Uuid::new_v4();
  let other_org = Uuid::new_v4();
  let fresh = profile("Fresh");
  let returning = profile("Returning");
  let moved = profile("Moved");

  let src = MemorySource {
    stories: vec![
      by(story(org, "old", at(2023, 11, 1)), &returning),
      by(story(other_org, "old elsewhere", at(2020, 1, 1)), &moved),
      by(story(org, "a", at(2024, 1, 1)), &fresh),
      by(story(org, "b", at(2024, 2, 1)), &fresh),
      by(story(org, "c", at(2024, 3, 1)), &returning),
      by(story(org, "d", at(2024, 4, 1)), &moved),
    ],
    profiles: vec![fresh, returning, moved],
    ..Default::default()
  };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.engagement.active_storytellers, 3);
  assert_eq!(r.engagement.new_storytellers, 1);
}

#[tokio::test]
async fn missing_profiles_are_tolerated() {
  let org = Uuid::new_v4();
  let ghost = Uuid::new_v4();
  let mut s = story(org, "orphan", at(2024, 10, 10));
  s.storyteller_id = Some(ghost);
  let src = MemorySource { stories: vec![s], ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.summary.total_storytellers, 1);
  assert_eq!(r.summary.total_elders, 0);
  assert_eq!(r.engagement.new_storytellers, 1);
  assert_eq!(r.engagement.most_active_storytellers[0].name, UNKNOWN_STORYTELLER);
  assert_eq!(r.featured.top_stories[0].storyteller_name, ANONYMOUS);
}

// ─── Contract ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_calls_are_identical() {
  let org = Uuid::new_v4();
  let teller = profile("Teller");
  let mut a = by(story(org, "a", at(2024, 3, 3)), &teller);
  a.category = Some("health".into());
  a.related_service = Some("clinic".into());
  a.views = Some(3);
  let src = MemorySource {
    stories: vec![a, story(org, "b", at(2024, 4, 4))],
    profiles: vec![teller],
    ..Default::default()
  };

  let first = generate_annual_report(&src, org, 2024).await.unwrap();
  let second = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn any_failed_fetch_aborts_the_report() {
  let org = Uuid::new_v4();
  let teller = profile("Teller");
  let stories = vec![
    by(story(org, "this year", at(2024, 5, 5)), &teller),
    story(org, "last year", at(2023, 5, 5)),
  ];

  for read in [Read::Stories, Read::Profiles, Read::Count, Read::EarliestDates] {
    let src = MemorySource {
      stories: stories.clone(),
      profiles: vec![teller.clone()],
      failing: vec![read],
    };
    let err = generate_annual_report(&src, org, 2024).await.unwrap_err();
    assert!(matches!(err, Error::Source(_)), "{read:?} failure should abort, got {err:?}");
  }

  let healthy = MemorySource { stories, profiles: vec![teller], ..Default::default() };
  assert!(generate_annual_report(&healthy, org, 2024).await.is_ok());
}

#[tokio::test]
async fn huge_counters_saturate_instead_of_overflowing() {
  let org = Uuid::new_v4();
  let stories: Vec<Story> = (0..3)
    .map(|i| {
      let mut s = story(org, &format!("viral {i}"), at(2024, 8, 1));
      s.views = Some(i64::MAX as u64);
      s.shares = Some(i64::MAX as u64);
      s.people_affected = Some(i64::MAX as u64);
      s.related_service = Some("clinic".into());
      s
    })
    .collect();
  let src = MemorySource { stories, ..Default::default() };

  let r = generate_annual_report(&src, org, 2024).await.unwrap();
  assert_eq!(r.summary.total_views, u64::MAX);
  assert_eq!(r.summary.total_shares, u64::MAX);
  assert_eq!(r.summary.total_people_affected, u64::MAX);
  assert_eq!(r.impact.service_effectiveness[0].people_affected, u64::MAX);
  assert_eq!(r.featured.top_stories.len(), 3);
}

#[tokio::test]
async fn unrepresentable_year_is_rejected() {
  let src = MemorySource::default();
  let err = generate_annual_report(&src, Uuid::new_v4(), i32::MIN).await.unwrap_err();
  assert!(matches!(err, Error::InvalidYear(_)));
}

#[tokio::test]
async fn point_and_batched_earlier_story_checks_agree() {
  let org = Uuid::new_v4();
  let teller = profile("Teller");
  let src = MemorySource {
    stories: vec![by(story(org, "old", at(2022, 6, 1)), &teller)],
    profiles: vec![teller.clone()],
    ..Default::default()
  };
  let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

  let has_earlier = src.storyteller_has_earlier_story(teller.id, cutoff).await.unwrap();
  let dates = src.earliest_story_dates(&[teller.id]).await.unwrap();
  assert!(has_earlier);
  assert!(dates[&teller.id] < cutoff);

  let src = MemorySource { failing: vec![Read::EarlierStory], ..src };
  assert!(src.storyteller_has_earlier_story(teller.id, cutoff).await.is_err());
}
