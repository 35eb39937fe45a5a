use crate::{
    boundary::RowPosition,
    config::TrackerConfig,
    error::InternalError,
    obs::sink::{MetricsEvent, record},
    predicate::GapPredicate,
    tracker::{FetchRequest, GapTracker, RowSource},
};

///
/// PollOutcome
///
/// What one cycle did: the predicate it queried with, the rows that came
/// back, and the gap count on either side of the merge.
///

#[derive(Clone, Debug)]
pub struct PollOutcome {
    pub predicate: GapPredicate,
    pub fetched: Vec<RowPosition>,
    pub gaps_before: usize,
    pub gaps_after: usize,
}

impl PollOutcome {
    #[must_use]
    pub const fn changed(&self) -> bool {
        !self.fetched.is_empty()
    }
}

///
/// Poller
///
/// Predicate → fetch → merge, one category per call.
///

#[derive(Debug)]
pub struct Poller<S: RowSource> {
    tracker: GapTracker,
    source: S,
    batch_size: usize,
}

impl<S: RowSource> Poller<S> {
    #[must_use]
    pub const fn new(tracker: GapTracker, source: S, batch_size: usize) -> Self {
        Self {
            tracker,
            source,
            batch_size,
        }
    }

    #[must_use]
    pub fn from_config(config: &TrackerConfig, source: S) -> Self {
        Self::new(GapTracker::from_config(config), source, config.batch_size)
    }

    #[must_use]
    pub const fn tracker(&self) -> &GapTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Run one poll cycle for `category`.
    pub fn poll_once(&mut self, category: &str) -> Result<PollOutcome, InternalError> {
        let predicate = self.tracker.predicate(category);
        let request = FetchRequest {
            predicate,
            batch_size: self.batch_size,
        };

        let fetched = self.source.fetch(&request)?;

        let gaps_before = self.tracker.gaps(category).map_or(0, |gaps| gaps.len());
        let gaps_after = match self.tracker.observe(category, &fetched)? {
            Some(gaps) => gaps.len(),
            None => gaps_before,
        };

        // only batches the tracker accepted count as fetched
        record(MetricsEvent::PollCycle {
            category,
            rows_fetched: fetched.len(),
        });

        Ok(PollOutcome {
            predicate: request.predicate,
            fetched,
            gaps_before,
            gaps_after,
        })
    }
}
