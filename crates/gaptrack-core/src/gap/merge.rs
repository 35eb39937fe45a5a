use crate::{
    boundary::{Boundary, OrderingMode, RowPosition},
    error::InternalError,
    gap::{GapSet, Interval, evict},
    obs::sink::{MetricsEvent, record},
};
use serde::{Deserialize, Serialize};

///
/// MergeOptions
///
/// `limit == 0` leaves the merged set unbounded.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MergeOptions {
    pub limit: usize,
    pub ordering: OrderingMode,
    pub eviction: evict::EvictionPolicy,
}

impl MergeOptions {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub const fn with_eviction(mut self, eviction: evict::EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }
}

impl GapSet {
    /// Excise the freshly fetched window `[low, high]` and return the new set.
    ///
    /// Preconditions: `low <= high` under `options.ordering`, and `self` is
    /// ascending and non-overlapping. Violations are a caller contract breach;
    /// debug builds assert on the window, release builds return a set whose
    /// layout is unspecified. Use [`GapSet::try_merge`] to reject them instead.
    #[must_use]
    pub fn merge(&self, low: RowPosition, high: RowPosition, options: &MergeOptions) -> Self {
        let low = Boundary::Interior(low);
        let high = Boundary::Interior(high);
        let ordering = options.ordering;

        debug_assert!(
            low.le(&high, ordering),
            "merge window must be ascending: low {low} is after high {high}"
        );

        if self.intervals.is_empty() {
            record(MetricsEvent::MergeBootstrap {
                category: &self.category,
            });
            tracing::trace!(category = %self.category, %low, %high, "bootstrapping gap set");

            return Self::from_intervals(
                self.category.clone(),
                vec![
                    Interval::new(Boundary::LowSentinel, low),
                    Interval::new(high, Boundary::HighSentinel),
                ],
            );
        }

        let mut merged = excise(&self.intervals, &low, &high, ordering);
        let evicted = evict::evict(&mut merged, options.limit, &options.eviction);

        record(MetricsEvent::MergeSteady {
            category: &self.category,
            gaps_in: self.intervals.len(),
            gaps_out: merged.len(),
        });
        if let Some(stats) = evicted {
            record(MetricsEvent::Eviction {
                category: &self.category,
                narrow_dropped: stats.narrow_dropped,
                truncated: stats.truncated,
            });
            tracing::debug!(
                category = %self.category,
                narrow = stats.narrow_dropped,
                truncated = stats.truncated,
                limit = options.limit,
                "gap set over capacity"
            );
        }
        tracing::trace!(
            category = %self.category,
            %low,
            %high,
            gaps_in = self.intervals.len(),
            gaps_out = merged.len(),
            "merged fetch window"
        );

        Self::from_intervals(self.category.clone(), merged)
    }

    /// Checked variant of [`GapSet::merge`].
    ///
    /// Rejects an inverted window and an input set that fails
    /// [`GapSet::validate`] under `options.ordering`.
    pub fn try_merge(
        &self,
        low: RowPosition,
        high: RowPosition,
        options: &MergeOptions,
    ) -> Result<Self, InternalError> {
        let (low_b, high_b) = (Boundary::Interior(low), Boundary::Interior(high));
        if !low_b.le(&high_b, options.ordering) {
            return Err(InternalError::gap_invariant(format!(
                "merge window for '{}' is inverted: low {low_b} is after high {high_b}",
                self.category
            )));
        }
        self.validate(options.ordering)?;

        Ok(self.merge(low, high, options))
    }
}

// Lower pass then upper pass; the concatenation stays ascending.
fn excise(
    previous: &[Interval],
    low: &Boundary,
    high: &Boundary,
    ordering: OrderingMode,
) -> Vec<Interval> {
    let mut merged = Vec::with_capacity(previous.len() + 1);

    for gap in previous {
        if gap.to.lt(low, ordering) {
            merged.push(*gap);
        } else if gap.from.lt(low, ordering) {
            merged.push(Interval::new(gap.from, *low));
        }
    }

    for gap in previous {
        if gap.to.le(high, ordering) {
            continue;
        }
        if gap.from.lt(high, ordering) {
            merged.push(Interval::new(*high, gap.to));
        } else {
            merged.push(*gap);
        }
    }

    merged
}
