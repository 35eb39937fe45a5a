//! Shared fixtures for unit tests.

use crate::boundary::{Boundary, RowPosition};

const BASE_WEIGHT: f64 = 10_000.0;
const BASE_CREATE_TIME: i64 = 100_000;

/// Row whose weight and create time both rise with its id.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn row(id: i64) -> RowPosition {
    RowPosition::new(id, BASE_WEIGHT + id as f64, BASE_CREATE_TIME + id)
}

/// Interior boundary for [`row`].
pub(crate) fn at(id: i64) -> Boundary {
    Boundary::Interior(row(id))
}

/// Resource ids of each interval end; `None` marks a sentinel.
pub(crate) fn ids(gaps: &[crate::gap::Interval]) -> Vec<(Option<i64>, Option<i64>)> {
    gaps.iter()
        .map(|gap| (gap.from.resource_id(), gap.to.resource_id()))
        .collect()
}
