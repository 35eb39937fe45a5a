use crate::boundary::{Boundary, RowPosition, UNBOUNDED_DISTANCE, WEIGHT_EPSILON};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// OrderingMode
///
/// Comparator used for interior boundaries.
///
/// `Literal` is the deployed comparator: `a < b` holds when
/// `a.weight - b.weight < ε` OR `a.create_time < b.create_time`. It is
/// reflexive and not antisymmetric, so it is not a strict order.
///
/// `Lexicographic` compares weight within ε first, then `create_time`.
///
/// Sentinel handling is identical in both modes.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    #[default]
    Literal,
    Lexicographic,
}

impl OrderingMode {
    /// Strict "before" between two boundaries.
    #[must_use]
    pub fn lt(self, left: &Boundary, right: &Boundary) -> bool {
        match (left, right) {
            (Boundary::LowSentinel, Boundary::LowSentinel) | (Boundary::HighSentinel, _) => false,
            (Boundary::LowSentinel, _) | (_, Boundary::HighSentinel) => true,
            (_, Boundary::LowSentinel) => false,
            (Boundary::Interior(left), Boundary::Interior(right)) => match self {
                Self::Literal => literal_lt(left, right),
                Self::Lexicographic => lexicographic_lt(left, right),
            },
        }
    }
}

// OR, not lexicographic; see OrderingMode::Literal.
fn literal_lt(left: &RowPosition, right: &RowPosition) -> bool {
    left.weight - right.weight < WEIGHT_EPSILON || left.create_time < right.create_time
}

fn lexicographic_lt(left: &RowPosition, right: &RowPosition) -> bool {
    position_cmp(left, right) == Ordering::Less
}

/// Weight first, ties within ε broken by `create_time`.
///
/// Not transitive across chains of near-equal weights; callers that need
/// an ascending pair must re-check it under their [`OrderingMode`].
#[must_use]
pub fn position_cmp(left: &RowPosition, right: &RowPosition) -> Ordering {
    if (left.weight - right.weight).abs() >= WEIGHT_EPSILON {
        return left.weight.total_cmp(&right.weight);
    }

    left.create_time.cmp(&right.create_time)
}

/// Approximate signed separation between two boundaries.
///
/// Boundaries of different kinds are `±UNBOUNDED_DISTANCE` apart (positive
/// when `left` ranks after `right`). Same-kind sentinels are zero apart.
/// Two interior boundaries yield the difference of their resource ids,
/// which is a proxy for width along the id axis rather than the weight axis.
#[must_use]
pub fn distance(left: &Boundary, right: &Boundary) -> i64 {
    let rank_delta = left.kind().rank() - right.kind().rank();
    if rank_delta != 0 {
        return if rank_delta > 0 {
            UNBOUNDED_DISTANCE
        } else {
            -UNBOUNDED_DISTANCE
        };
    }

    match (left, right) {
        (Boundary::Interior(left), Boundary::Interior(right)) => {
            left.resource_id.wrapping_sub(right.resource_id)
        }
        _ => 0,
    }
}
