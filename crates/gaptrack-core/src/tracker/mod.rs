//! Fetch-loop components.
//!
//! [`GapTracker`] owns the one live gap set per category and swaps it after
//! each merge. [`Poller`] drives a [`RowSource`] through that tracker.

mod poller;
mod source;


pub use poller::{PollOutcome, Poller};
pub use source::{FetchRequest, MemoryTable, RowSource, TableRow};

use crate::{
    boundary::{Boundary, OrderingMode, RowPosition, position_cmp},
    config::TrackerConfig,
    error::{ErrorClass, ErrorOrigin, InternalError},
    gap::{GapSet, MergeOptions},
    predicate::{GapPredicate, build_predicate},
};
use std::collections::BTreeMap;

///
/// BatchWindow
///
/// `[low, high]` span of one fetched batch, ascending under the ordering it
/// was computed with.
///

#[derive(Clone, Copy, Debug)]
pub struct BatchWindow {
    pub low: RowPosition,
    pub high: RowPosition,
}

impl BatchWindow {
    /// Compute the window of `rows` under `ordering`; `None` for an empty
    /// batch.
    pub fn from_rows(
        rows: &[RowPosition],
        ordering: OrderingMode,
    ) -> Result<Option<Self>, InternalError> {
        if let Some(bad) = rows.iter().find(|row| !row.weight.is_finite()) {
            return Err(InternalError::new(
                ErrorClass::Unsupported,
                ErrorOrigin::Boundary,
                format!("row {} has a non-finite weight", bad.resource_id),
            ));
        }

        let (Some(mut low), Some(mut high)) = (
            rows.iter().copied().min_by(position_cmp),
            rows.iter().copied().max_by(position_cmp),
        ) else {
            return Ok(None);
        };

        // near-equal weight chains can leave the extremes out of order
        if !Boundary::from(low).le(&Boundary::from(high), ordering) {
            std::mem::swap(&mut low, &mut high);
        }

        Ok(Some(Self { low, high }))
    }
}

///
/// GapTracker
///
/// Holds the current gap set for every category it has seen. Mutation goes
/// through `&mut self`, so at most one merge per tracker is ever in flight;
/// share a tracker across threads behind a lock.
///

#[derive(Clone, Debug, Default)]
pub struct GapTracker {
    options: MergeOptions,
    gaps: BTreeMap<String, GapSet>,
}

impl GapTracker {
    #[must_use]
    pub const fn new(options: MergeOptions) -> Self {
        Self {
            options,
            gaps: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.merge_options())
    }

    #[must_use]
    pub const fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Current gap set for `category`, if one has been formed.
    #[must_use]
    pub fn gaps(&self, category: &str) -> Option<&GapSet> {
        self.gaps.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.gaps.keys().map(String::as_str)
    }

    /// Predicate for the next poll of `category`.
    ///
    /// An unseen category yields the category-only predicate.
    #[must_use]
    pub fn predicate(&self, category: &str) -> GapPredicate {
        match self.gaps.get(category) {
            Some(gaps) => build_predicate(gaps),
            None => build_predicate(&GapSet::new(category)),
        }
    }

    /// Fold a freshly fetched batch into the gap set of `category`.
    ///
    /// Returns `None` when the batch is empty and nothing changed.
    pub fn observe(
        &mut self,
        category: &str,
        batch: &[RowPosition],
    ) -> Result<Option<&GapSet>, InternalError> {
        let Some(window) = BatchWindow::from_rows(batch, self.options.ordering)? else {
            tracing::debug!(category, "empty batch; gap set unchanged");
            return Ok(None);
        };

        let previous = self
            .gaps
            .remove(category)
            .unwrap_or_else(|| GapSet::new(category));
        let next = previous.merge(window.low, window.high, &self.options);

        tracing::debug!(
            category,
            rows = batch.len(),
            low = %window.low,
            high = %window.high,
            gaps_before = previous.len(),
            gaps_after = next.len(),
            "observed batch"
        );

        let slot = self.gaps.entry(category.to_string()).or_insert(next);

        Ok(Some(slot))
    }

    /// Install a gap set restored by the caller, replacing any current one.
    ///
    /// Under [`OrderingMode::Lexicographic`] the layout is validated first.
    pub fn restore(&mut self, gaps: GapSet) -> Result<(), InternalError> {
        if self.options.ordering == OrderingMode::Lexicographic {
            gaps.validate(self.options.ordering)?;
        }
        if gaps.category().is_empty() {
            return Err(InternalError::tracker_invariant(
                "restored gap set has an empty category",
            ));
        }

        self.gaps.insert(gaps.category().to_string(), gaps);

        Ok(())
    }

    /// Remove and return the gap set of `category`, e.g. for persistence.
    pub fn take(&mut self, category: &str) -> Option<GapSet> {
        self.gaps.remove(category)
    }
}
