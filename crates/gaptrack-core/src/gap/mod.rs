//! Gap sets: the ordered complement of everything fetched so far.

mod evict;
mod merge;

#[cfg(test)]
mod tests;

pub use evict::{DEFAULT_NARROW_THRESHOLD, EvictionPolicy, WidthMetric};
pub use merge::MergeOptions;

use crate::{
    DEFAULT_CATEGORY,
    boundary::{Boundary, OrderingMode},
    error::InternalError,
};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Interval
///
/// Open region `(from, to)` of sort-key space not yet known to be fetched.
///

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Interval {
    pub from: Boundary,
    pub to: Boundary,
}

impl Interval {
    #[must_use]
    pub const fn new(from: Boundary, to: Boundary) -> Self {
        Self { from, to }
    }

    /// Interval spanning the whole key space.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(Boundary::LowSentinel, Boundary::HighSentinel)
    }

    /// Whether `point` lies strictly between the two ends.
    #[must_use]
    pub fn contains(&self, point: &Boundary, ordering: OrderingMode) -> bool {
        self.from.lt(point, ordering) && point.lt(&self.to, ordering)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

///
/// GapSet
///
/// Ordered, non-overlapping gaps for one category.
///
/// An empty set means "uninitialized": nothing has been fetched yet and no
/// coverage information exists. Gap sets are values; [`GapSet::merge`]
/// returns a new set and never mutates its receiver.
///

#[derive(Clone, Debug, Deref, Deserialize, IntoIterator, PartialEq, Serialize)]
pub struct GapSet {
    category: String,

    #[deref]
    #[into_iterator(owned, ref)]
    intervals: Vec<Interval>,
}

impl GapSet {
    /// Construct an empty (uninitialized) gap set for `category`.
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            intervals: Vec::new(),
        }
    }

    /// Rebuild a gap set from a stored interval list.
    ///
    /// The list is taken as-is; call [`GapSet::validate`] when it comes from
    /// an untrusted store.
    #[must_use]
    pub fn from_intervals(category: impl Into<String>, intervals: Vec<Interval>) -> Self {
        Self {
            category: category.into(),
            intervals,
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    #[must_use]
    pub fn into_intervals(self) -> Vec<Interval> {
        self.intervals
    }

    /// Whether any gap strictly contains `point`.
    #[must_use]
    pub fn contains(&self, point: &Boundary, ordering: OrderingMode) -> bool {
        self.intervals
            .iter()
            .any(|interval| interval.contains(point, ordering))
    }

    /// Check the ascending, non-overlapping layout under `ordering`.
    ///
    /// Only meaningful for [`OrderingMode::Lexicographic`]; the literal
    /// comparator accepts almost any layout.
    pub fn validate(&self, ordering: OrderingMode) -> Result<(), InternalError> {
        for (idx, interval) in self.intervals.iter().enumerate() {
            if !interval.from.lt(&interval.to, ordering) {
                return Err(InternalError::gap_invariant(format!(
                    "gap {idx} of '{}' is empty or inverted: {interval}",
                    self.category
                )));
            }
        }

        for (idx, pair) in self.intervals.windows(2).enumerate() {
            if !pair[0].to.le(&pair[1].from, ordering) {
                return Err(InternalError::gap_invariant(format!(
                    "gap {} of '{}' overlaps its predecessor: {} then {}",
                    idx + 1,
                    self.category,
                    pair[0],
                    pair[1]
                )));
            }
        }

        Ok(())
    }
}

impl Default for GapSet {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY)
    }
}

impl fmt::Display for GapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.category)?;
        for interval in &self.intervals {
            writeln!(f, "  {interval}")?;
        }
        f.write_str("}")
    }
}
