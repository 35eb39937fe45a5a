//! Predicate construction: render a gap set into a filter selecting the rows
//! of its category that fall inside any tracked gap.
//!
//! The structured form ([`GapPredicate`]) is the contract; SQL text is one
//! rendering of it.

mod render;


pub use render::PredicateColumns;

use crate::{
    gap::GapSet,
    obs::sink::{MetricsEvent, record},
};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// GapClause
///
/// Exclusive `resource_id` bounds for one gap. A missing side means the gap
/// is open-ended on that side; a clause with neither side matches every row.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GapClause {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl GapClause {
    #[must_use]
    pub const fn new(lower: Option<i64>, upper: Option<i64>) -> Self {
        Self { lower, upper }
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    #[must_use]
    pub fn matches(&self, resource_id: i64) -> bool {
        self.lower.is_none_or(|lower| lower < resource_id)
            && self.upper.is_none_or(|upper| resource_id < upper)
    }
}

///
/// GapPredicate
///
/// `category = <category> AND (clause OR clause ...)`; with no clauses only
/// the category condition remains.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GapPredicate {
    pub category: String,
    pub clauses: Vec<GapClause>,
}

impl GapPredicate {
    /// Whether a row of `category` with `resource_id` is selected.
    #[must_use]
    pub fn matches(&self, category: &str, resource_id: i64) -> bool {
        if category != self.category {
            return false;
        }
        if self.clauses.is_empty() {
            return true;
        }

        self.clauses.iter().any(|clause| clause.matches(resource_id))
    }

    /// Render the condition with custom column names.
    #[must_use]
    pub fn to_sql(&self, columns: &PredicateColumns) -> String {
        render::render_condition(self, columns)
    }

    /// Render the full polling query against `table`.
    #[must_use]
    pub fn select_sql(&self, table: &str, columns: &PredicateColumns) -> String {
        format!("select * from {table} where {}", self.to_sql(columns))
    }
}

impl fmt::Display for GapPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql(&PredicateColumns::default()))
    }
}

/// Build the predicate for `gaps`.
///
/// Each gap contributes one clause: a lower bound unless it starts at the
/// low sentinel, an upper bound unless it ends at the high sentinel.
#[must_use]
pub fn build_predicate(gaps: &GapSet) -> GapPredicate {
    let clauses: Vec<GapClause> = gaps
        .iter()
        .map(|gap| GapClause::new(gap.from.resource_id(), gap.to.resource_id()))
        .collect();

    record(MetricsEvent::PredicateBuilt {
        category: gaps.category(),
        clauses: clauses.len(),
    });

    GapPredicate {
        category: gaps.category().to_string(),
        clauses,
    }
}
