//! Core runtime for gaptrack: sort-key boundaries, gap sets, the merge and
//! eviction algorithm, predicate construction, and the fetch-loop components
//! that drive them.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod boundary;
pub mod config;
pub mod error;
pub mod gap;
pub mod obs;
pub mod predicate;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Category assigned to gap sets when the caller does not name one.
pub const DEFAULT_CATEGORY: &str = "common";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or sources are re-exported here.
///

pub mod prelude {
    pub use crate::{
        boundary::{Boundary, OrderingMode, RowPosition},
        gap::{EvictionPolicy, GapSet, Interval, MergeOptions, WidthMetric},
        predicate::{GapPredicate, build_predicate},
    };
}
