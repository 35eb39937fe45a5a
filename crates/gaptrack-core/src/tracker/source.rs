use crate::{boundary::RowPosition, error::InternalError, predicate::GapPredicate};
use serde::{Deserialize, Serialize};

///
/// FetchRequest
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchRequest {
    pub predicate: GapPredicate,
    pub batch_size: usize,
}

///
/// RowSource
///
/// Backing store queried once per poll. Implementations return at most
/// `batch_size` rows matching the predicate, newest first.
///

pub trait RowSource {
    fn fetch(&mut self, request: &FetchRequest) -> Result<Vec<RowPosition>, InternalError>;
}

///
/// TableRow
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TableRow {
    pub category: String,
    pub position: RowPosition,
}

///
/// MemoryTable
///
/// In-process resource table that evaluates [`GapPredicate`] directly.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryTable {
    rows: Vec<TableRow>,
}

impl MemoryTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn insert(&mut self, category: impl Into<String>, position: RowPosition) {
        self.rows.push(TableRow {
            category: category.into(),
            position,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }
}

impl RowSource for MemoryTable {
    fn fetch(&mut self, request: &FetchRequest) -> Result<Vec<RowPosition>, InternalError> {
        if request.batch_size == 0 {
            return Err(InternalError::source_unsupported(
                "fetch requires a batch size greater than zero",
            ));
        }

        let mut matched: Vec<RowPosition> = self
            .rows
            .iter()
            .filter(|row| {
                request
                    .predicate
                    .matches(&row.category, row.position.resource_id)
            })
            .map(|row| row.position)
            .collect();

        // newest first
        matched.sort_by(|left, right| {
            right
                .weight
                .total_cmp(&left.weight)
                .then(right.create_time.cmp(&left.create_time))
        });
        matched.truncate(request.batch_size);

        Ok(matched)
    }
}
