use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    predicate::{GapClause, GapPredicate},
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

///
/// PredicateColumns
///
/// Column names used when rendering SQL. Names are restricted to plain
/// identifiers because they are spliced in unquoted.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PredicateColumns {
    category: String,
    position: String,
}

impl PredicateColumns {
    pub fn new(
        category: impl Into<String>,
        position: impl Into<String>,
    ) -> Result<Self, InternalError> {
        let category = category.into();
        let position = position.into();

        for name in [&category, &position] {
            if !is_identifier(name) {
                return Err(InternalError::new(
                    ErrorClass::Unsupported,
                    ErrorOrigin::Predicate,
                    format!("column name '{name}' is not a plain identifier"),
                ));
            }
        }

        Ok(Self { category, position })
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn position(&self) -> &str {
        &self.position
    }
}

impl Default for PredicateColumns {
    fn default() -> Self {
        Self {
            category: "category".to_string(),
            position: "resource_id".to_string(),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(super) fn render_condition(predicate: &GapPredicate, columns: &PredicateColumns) -> String {
    let mut out = format!(
        "{} = '{}'",
        columns.category,
        predicate.category.replace('\'', "''")
    );
    if predicate.clauses.is_empty() {
        return out;
    }

    out.push_str(" AND (");
    for (idx, clause) in predicate.clauses.iter().enumerate() {
        if idx > 0 {
            out.push_str(" OR ");
        }
        let _ = write!(out, "({})", render_clause(clause, &columns.position));
    }
    out.push(')');

    out
}

fn render_clause(clause: &GapClause, column: &str) -> String {
    match (clause.lower, clause.upper) {
        (Some(lower), Some(upper)) => format!("{lower} < {column} AND {column} < {upper}"),
        (Some(lower), None) => format!("{lower} < {column}"),
        (None, Some(upper)) => format!("{column} < {upper}"),
        // (-inf, +inf): always true
        (None, None) => "1 = 1".to_string(),
    }
}
