use crate::{
    boundary::{Boundary, UNBOUNDED_DISTANCE, distance},
    gap::Interval,
};
use serde::{Deserialize, Serialize};

/// Gaps narrower than this are dropped first when a set runs over capacity.
pub const DEFAULT_NARROW_THRESHOLD: f64 = 10.0;

///
/// WidthMetric
///
/// How eviction measures the width of a gap.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthMetric {
    /// `distance(to, from)`: resource-id difference, `±UNBOUNDED_DISTANCE`
    /// across kinds. Cheap but blind to the weight axis.
    #[default]
    #[serde(rename = "resource_id")]
    ResourceIdProxy,

    /// Weight difference between interior ends.
    Weight,
}

impl WidthMetric {
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn width(self, interval: &Interval) -> f64 {
        match self {
            Self::ResourceIdProxy => distance(&interval.to, &interval.from) as f64,
            Self::Weight => weight_width(&interval.to, &interval.from),
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn weight_width(to: &Boundary, from: &Boundary) -> f64 {
    match (to, from) {
        (Boundary::Interior(to), Boundary::Interior(from)) => to.weight - from.weight,
        (Boundary::LowSentinel, Boundary::LowSentinel)
        | (Boundary::HighSentinel, Boundary::HighSentinel) => 0.0,
        _ => distance(to, from).signum() as f64 * UNBOUNDED_DISTANCE as f64,
    }
}

///
/// EvictionPolicy
///
/// Narrow-gap threshold and width metric applied when a merged set exceeds
/// its capacity.
///

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct EvictionPolicy {
    pub narrow_threshold: f64,
    pub metric: WidthMetric,
}

impl EvictionPolicy {
    #[must_use]
    pub const fn new(narrow_threshold: f64, metric: WidthMetric) -> Self {
        Self {
            narrow_threshold,
            metric,
        }
    }

    #[must_use]
    pub fn is_narrow(&self, interval: &Interval) -> bool {
        self.metric.width(interval) < self.narrow_threshold
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_NARROW_THRESHOLD, WidthMetric::default())
    }
}

///
/// EvictionStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct EvictionStats {
    pub(crate) narrow_dropped: usize,
    pub(crate) truncated: usize,
}

/// Enforce `limit` on `intervals` in place.
///
/// Returns `None` when the set was within capacity and left untouched.
pub(super) fn evict(
    intervals: &mut Vec<Interval>,
    limit: usize,
    policy: &EvictionPolicy,
) -> Option<EvictionStats> {
    if limit == 0 || intervals.len() <= limit {
        return None;
    }

    let mut stats = EvictionStats::default();

    // narrow gaps first; do not advance past a removed slot
    let mut idx = 0;
    while idx < intervals.len() {
        if policy.is_narrow(&intervals[idx]) {
            let dropped = intervals.remove(idx);
            tracing::debug!(
                from = %dropped.from,
                to = %dropped.to,
                "evicting narrow gap"
            );
            stats.narrow_dropped += 1;
            continue;
        }
        idx += 1;
    }

    // keep the newest (highest) gaps
    if intervals.len() > limit {
        let excess = intervals.len() - limit;
        intervals.drain(..excess);
        stats.truncated = excess;
    }

    // first surviving gap always starts at -inf
    if let Some(first) = intervals.first_mut() {
        first.from = Boundary::LowSentinel;
    }

    Some(stats)
}
