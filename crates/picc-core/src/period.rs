//! Calendar-year reporting periods.
//!
//! All boundaries are UTC. A period is stored as its first and last calendar
//! date and queried as the half-open instant range
//! `[start 00:00:00Z, day-after-end 00:00:00Z)`, so every instant of the last
//! day belongs to the period.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  record::{earliest_storable, storable_limit},
  source::StoryFilter,
};

/// The inclusive calendar-date window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportingPeriod {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl ReportingPeriod {
  /// `year-01-01` through `year-12-31`.
  pub fn calendar_year(year: i32) -> Result<Self> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(Error::InvalidYear(year))?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(Error::InvalidYear(year))?;
    Ok(Self { start, end })
  }

  pub fn year(&self) -> i32 { self.start.year() }

  /// The calendar year immediately before this one.
  pub fn previous(&self) -> Result<Self> {
    let year = self.year();
    let prior = year.checked_sub(1).ok_or(Error::InvalidYear(year))?;
    Self::calendar_year(prior)
  }

  /// First instant of the period.
  pub fn start_instant(&self) -> DateTime<Utc> {
    self.start.and_time(NaiveTime::MIN).and_utc()
  }

  /// First instant after the period (exclusive bound).
  pub fn end_instant(&self) -> Result<DateTime<Utc>> {
    let next = self.end.succ_opt().ok_or(Error::InvalidYear(self.year()))?;
    Ok(next.and_time(NaiveTime::MIN).and_utc())
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    let date = at.date_naive();
    self.start <= date && date <= self.end
  }

  /// Story filter covering this period for one organization.
  ///
  /// Bounds are clamped to the storable range; periods entirely outside it
  /// yield an empty window.
  pub fn filter(&self, organization_id: Uuid) -> Result<StoryFilter> {
    let (lo, hi) = (earliest_storable(), storable_limit());
    Ok(StoryFilter {
      organization_id,
      created_from: self.start_instant().clamp(lo, hi),
      created_until: self.end_instant()?.clamp(lo, hi),
    })
  }
}
