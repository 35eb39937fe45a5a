use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for merge, predicate, and poll activity.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub categories: BTreeMap<String, CategoryCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            categories: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Merge entrypoints
    pub merge_bootstraps: u64,
    pub merge_calls: u64,
    pub gaps_in: u64,
    pub gaps_out: u64,

    // Capacity enforcement
    pub evictions: u64,
    pub narrow_dropped: u64,
    pub truncated: u64,

    // Predicate construction
    pub predicates_built: u64,
    pub predicate_clauses: u64,

    // Poll loop
    pub poll_cycles: u64,
    pub rows_fetched: u64,
    pub empty_polls: u64,
}

///
/// CategoryCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CategoryCounters {
    pub merge_calls: u64,
    pub evictions: u64,
    pub poll_cycles: u64,
    pub rows_fetched: u64,
    pub last_gap_count: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Borrow (or create) the counters for one category.
pub(crate) fn category_entry<'a>(m: &'a mut EventState, category: &str) -> &'a mut CategoryCounters {
    m.categories.entry(category.to_string()).or_default()
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `since_ms`.
    pub counters: Option<EventState>,
    /// Per-category counters and averages.
    pub category_counters: Vec<CategorySummary>,
}

///
/// CategorySummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub merge_calls: u64,
    pub evictions: u64,
    pub poll_cycles: u64,
    pub rows_fetched: u64,
    pub last_gap_count: u64,
    pub avg_rows_per_poll: f64,
}

/// Build a metrics report from the in-memory counters.
///
/// `window_start_ms` filters by window start (`EventState::since_ms`): a
/// window that began before the requested start reports no counters.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|start| snap.since_ms < start) {
        return EventReport::default();
    }

    let category_counters = snap
        .categories
        .iter()
        .map(|(category, counters)| CategorySummary {
            category: category.clone(),
            merge_calls: counters.merge_calls,
            evictions: counters.evictions,
            poll_cycles: counters.poll_cycles,
            rows_fetched: counters.rows_fetched,
            last_gap_count: counters.last_gap_count,
            avg_rows_per_poll: if counters.poll_cycles > 0 {
                counters.rows_fetched as f64 / counters.poll_cycles as f64
            } else {
                0.0
            },
        })
        .collect();

    EventReport {
        counters: Some(snap),
        category_counters,
    }
}
