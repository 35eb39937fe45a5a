//! Sort-key boundaries: concrete row positions and the two open-ended
//! sentinels that bracket them.

mod compare;


pub use compare::{OrderingMode, distance, position_cmp};

use serde::{Deserialize, Serialize};
use std::fmt;

///
/// CONSTANTS
///

/// Tolerance used when comparing weights.
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Magnitude returned by [`distance`] for boundaries of different kinds.
pub const UNBOUNDED_DISTANCE: i64 = 9_999_999;

///
/// RowPosition
///
/// Concrete position of one row in sort-key space.
/// `weight` is the primary sort value, `create_time` the secondary one;
/// `resource_id` identifies the row and never participates in ordering.
///

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct RowPosition {
    pub resource_id: i64,
    pub weight: f64,
    pub create_time: i64,
}

impl RowPosition {
    #[must_use]
    pub const fn new(resource_id: i64, weight: f64, create_time: i64) -> Self {
        Self {
            resource_id,
            weight,
            create_time,
        }
    }

    /// Tolerant equality on the sort key; `resource_id` is ignored.
    #[must_use]
    pub fn same_key(&self, other: &Self) -> bool {
        (self.weight - other.weight).abs() < WEIGHT_EPSILON && self.create_time == other.create_time
    }
}

impl fmt::Display for RowPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.resource_id, self.weight, self.create_time
        )
    }
}

///
/// BoundaryKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BoundaryKind {
    LowSentinel,
    Interior,
    HighSentinel,
}

impl BoundaryKind {
    /// Rank used by [`distance`]; low sentinel first, high sentinel last.
    #[must_use]
    pub const fn rank(self) -> i8 {
        match self {
            Self::LowSentinel => -1,
            Self::Interior => 0,
            Self::HighSentinel => 1,
        }
    }
}

///
/// Boundary
///
/// A position in sort-key space. Sentinels carry no row fields, so two
/// sentinels of the same kind are always equal.
///

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", content = "position", rename_all = "snake_case")]
pub enum Boundary {
    LowSentinel,
    Interior(RowPosition),
    HighSentinel,
}

impl Boundary {
    #[must_use]
    pub const fn interior(resource_id: i64, weight: f64, create_time: i64) -> Self {
        Self::Interior(RowPosition::new(resource_id, weight, create_time))
    }

    #[must_use]
    pub const fn kind(&self) -> BoundaryKind {
        match self {
            Self::LowSentinel => BoundaryKind::LowSentinel,
            Self::Interior(_) => BoundaryKind::Interior,
            Self::HighSentinel => BoundaryKind::HighSentinel,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Option<&RowPosition> {
        match self {
            Self::Interior(position) => Some(position),
            Self::LowSentinel | Self::HighSentinel => None,
        }
    }

    #[must_use]
    pub const fn resource_id(&self) -> Option<i64> {
        match self {
            Self::Interior(position) => Some(position.resource_id),
            Self::LowSentinel | Self::HighSentinel => None,
        }
    }

    #[must_use]
    pub const fn is_low_sentinel(&self) -> bool {
        matches!(self, Self::LowSentinel)
    }

    #[must_use]
    pub const fn is_high_sentinel(&self) -> bool {
        matches!(self, Self::HighSentinel)
    }

    /// Strict "before" under the selected ordering mode.
    #[must_use]
    pub fn lt(&self, other: &Self, mode: OrderingMode) -> bool {
        mode.lt(self, other)
    }

    /// `self == other || self < other` under the selected ordering mode.
    #[must_use]
    pub fn le(&self, other: &Self, mode: OrderingMode) -> bool {
        self == other || mode.lt(self, other)
    }
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::LowSentinel, Self::LowSentinel) | (Self::HighSentinel, Self::HighSentinel) => {
                true
            }
            (Self::Interior(left), Self::Interior(right)) => left.same_key(right),
            _ => false,
        }
    }
}

impl From<RowPosition> for Boundary {
    fn from(position: RowPosition) -> Self {
        Self::Interior(position)
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowSentinel => f.write_str("-inf"),
            Self::Interior(position) => position.fmt(f),
            Self::HighSentinel => f.write_str("+inf"),
        }
    }
}
