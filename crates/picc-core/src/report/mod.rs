//! The annual report document and the aggregator that builds it.
//!
//! A [`ReportDocument`] is never stored by this crate; it is derived fresh
//! from the record source on every call to [`generate_annual_report`].

mod aggregate;
mod breakdown;

#[cfg(test)]
mod tests;

use serde::Serialize;
use uuid::Uuid;

pub use aggregate::generate_annual_report;
pub use breakdown::Breakdown;

use crate::period::ReportingPeriod;

/// Sentinel for "most engaged category" and "most impactful service" when
/// there is nothing to rank.
pub const NONE: &str = "none";
/// Author name for featured stories with no storyteller.
pub const ANONYMOUS: &str = "Anonymous";
/// Name for ranked storytellers whose profile is missing or unnamed.
pub const UNKNOWN_STORYTELLER: &str = "Unknown";
/// Length of the storyteller and story rankings.
pub const TOP_N: usize = 10;

// ─── Document ────────────────────────────────────────────────────────────────

/// One year's aggregated view of the organization's stories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
  pub year:                i32,
  pub report_period:       ReportingPeriod,
  pub summary:             Summary,
  pub stories_by_category: Breakdown,
  pub stories_by_type:     Breakdown,
  /// Only stories that name a related service.
  pub stories_by_service:  Breakdown,
  /// Always twelve entries, January first.
  pub stories_by_month:    Vec<MonthCount>,
  pub cultural_metrics:    CulturalMetrics,
  pub engagement:          Engagement,
  pub impact:              Impact,
  pub featured:            Featured,
  pub insights:            Insights,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub total_stories:         u64,
  /// Distinct storytellers among the year's stories.
  pub total_storytellers:    u64,
  pub total_elders:          u64,
  pub total_youth:           u64,
  pub total_people_affected: u64,
  pub total_views:           u64,
  pub total_shares:          u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
  /// English month name, e.g. `"March"`.
  pub month: String,
  pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CulturalMetrics {
  pub traditional_knowledge_stories:  u64,
  pub elder_wisdom_stories:           u64,
  pub cultural_sensitivity_breakdown: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Engagement {
  pub active_storytellers:             u64,
  /// Storytellers whose first-ever story falls in the report year.
  pub new_storytellers:                u64,
  pub average_stories_per_storyteller: f64,
  pub most_active_storytellers:        Vec<ActiveStoryteller>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveStoryteller {
  pub storyteller_id: Uuid,
  pub name:           String,
  pub story_count:    u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Impact {
  pub total_people_affected: u64,
  pub impact_by_type:        Breakdown,
  /// Sorted by story count, descending; ties keep encounter order.
  pub service_effectiveness: Vec<ServiceEffectiveness>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEffectiveness {
  pub service:         String,
  pub story_count:     u64,
  pub people_affected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Featured {
  pub top_stories:            Vec<TopStory>,
  pub most_engaged_category:  String,
  pub most_impactful_service: String,
}

/// A story reduced to what a featured-content card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopStory {
  pub id:               Uuid,
  pub title:            String,
  pub storyteller_name: String,
  pub views:            u64,
  pub category:         Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
  /// Percentage change against the prior year's story count; zero when the
  /// prior year had no stories.
  pub growth_rate:              f64,
  pub most_common_category:     String,
  pub peak_month:               String,
  pub average_impact_per_story: f64,
}
