//! [`Breakdown`]: story counts keyed by a categorical field.

use serde::{Serialize, Serializer};

/// Counts per key, kept in first-encounter order.
///
/// Serialises as a JSON object whose keys appear in that order. Lookups are
/// linear; a report's key sets are small.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown {
  entries: Vec<(String, u64)>,
}

impl Breakdown {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, key: &str, n: u64) {
    match self.entries.iter_mut().find(|(k, _)| k == key) {
      Some((_, count)) => *count = count.saturating_add(n),
      None => self.entries.push((key.to_owned(), n)),
    }
  }

  pub fn increment(&mut self, key: &str) { self.add(key, 1) }

  /// Count for `key`; zero when the key was never seen.
  pub fn get(&self, key: &str) -> u64 {
    self
      .entries
      .iter()
      .find(|(k, _)| k == key)
      .map_or(0, |(_, n)| *n)
  }

  pub fn total(&self) -> u64 { self.entries.iter().fold(0, |acc, (_, n)| acc.saturating_add(*n)) }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
    self.entries.iter().map(|(k, n)| (k.as_str(), *n))
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|(k, _)| k.as_str()) }

  /// The key with the highest count; ties go to the key seen first.
  pub fn most_common(&self) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (key, n) in self.iter() {
      if best.is_none_or(|(_, top)| n > top) {
        best = Some((key, n));
      }
    }
    best.map(|(key, _)| key)
  }
}

impl<'a> FromIterator<&'a str> for Breakdown {
  fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
    let mut breakdown = Self::new();
    for key in iter {
      breakdown.increment(key);
    }
    breakdown
  }
}

impl Serialize for Breakdown {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(self.iter())
  }
}
