//! Metrics sink boundary.
//!
//! Gap-set and tracker logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between the algorithms and the
//! thread-local metrics state.
use crate::obs::metrics::{self, category_entry};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    MergeBootstrap {
        category: &'a str,
    },
    MergeSteady {
        category: &'a str,
        gaps_in: usize,
        gaps_out: usize,
    },
    Eviction {
        category: &'a str,
        narrow_dropped: usize,
        truncated: usize,
    },
    PredicateBuilt {
        category: &'a str,
        clauses: usize,
    },
    PollCycle {
        category: &'a str,
        rows_fetched: usize,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::MergeBootstrap { category } => {
                metrics::with_state_mut(|m| {
                    m.ops.merge_bootstraps = m.ops.merge_bootstraps.saturating_add(1);
                    let entry = category_entry(m, category);
                    entry.merge_calls = entry.merge_calls.saturating_add(1);
                    entry.last_gap_count = 2;
                });
            }

            MetricsEvent::MergeSteady {
                category,
                gaps_in,
                gaps_out,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.merge_calls = m.ops.merge_calls.saturating_add(1);
                    m.ops.gaps_in = m.ops.gaps_in.saturating_add(gaps_in as u64);
                    m.ops.gaps_out = m.ops.gaps_out.saturating_add(gaps_out as u64);
                    let entry = category_entry(m, category);
                    entry.merge_calls = entry.merge_calls.saturating_add(1);
                    entry.last_gap_count = gaps_out as u64;
                });
            }

            MetricsEvent::Eviction {
                category,
                narrow_dropped,
                truncated,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.evictions = m.ops.evictions.saturating_add(1);
                    m.ops.narrow_dropped = m.ops.narrow_dropped.saturating_add(narrow_dropped as u64);
                    m.ops.truncated = m.ops.truncated.saturating_add(truncated as u64);
                    let entry = category_entry(m, category);
                    entry.evictions = entry.evictions.saturating_add(1);
                });
            }

            MetricsEvent::PredicateBuilt { category: _, clauses } => {
                metrics::with_state_mut(|m| {
                    m.ops.predicates_built = m.ops.predicates_built.saturating_add(1);
                    m.ops.predicate_clauses =
                        m.ops.predicate_clauses.saturating_add(clauses as u64);
                });
            }

            MetricsEvent::PollCycle {
                category,
                rows_fetched,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.poll_cycles = m.ops.poll_cycles.saturating_add(1);
                    m.ops.rows_fetched = m.ops.rows_fetched.saturating_add(rows_fetched as u64);
                    if rows_fetched == 0 {
                        m.ops.empty_polls = m.ops.empty_polls.saturating_add(1);
                    }
                    let entry = category_entry(m, category);
                    entry.poll_cycles = entry.poll_cycles.saturating_add(1);
                    entry.rows_fetched = entry.rows_fetched.saturating_add(rows_fetched as u64);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` came from a live `&dyn MetricsSink` installed by
        //   `with_metrics_sink`, which restores the previous slot on every
        //   exit (including unwind) before that borrow ends.
        // - Only a shared reference is materialized and it does not outlive
        //   this synchronous call.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start (`EventState::since_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - The erased pointer is visible only while `f` runs; `Guard` puts the
    //   previous slot back on every exit, including panic.
    // - `record` dereferences it synchronously and never stores it.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, record, with_metrics_sink};
    use std::cell::RefCell;

    #[derive(Default)]
    struct CaptureSink {
        seen: RefCell<Vec<String>>,
    }

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent<'_>) {
            self.seen.borrow_mut().push(format!("{event:?}"));
        }
    }

    #[test]
    fn global_sink_accumulates_per_category_counters() {
        metrics_reset_all();

        record(MetricsEvent::MergeBootstrap { category: "news" });
        record(MetricsEvent::MergeSteady {
            category: "news",
            gaps_in: 2,
            gaps_out: 3,
        });
        record(MetricsEvent::PollCycle {
            category: "news",
            rows_fetched: 10,
        });
        record(MetricsEvent::PollCycle {
            category: "news",
            rows_fetched: 0,
        });

        let report = metrics_report(None);
        let counters = report.counters.expect("counters should be present");
        assert_eq!(counters.ops.merge_bootstraps, 1);
        assert_eq!(counters.ops.merge_calls, 1);
        assert_eq!(counters.ops.gaps_out, 3);
        assert_eq!(counters.ops.empty_polls, 1);

        let news = &report.category_counters[0];
        assert_eq!(news.category, "news");
        assert_eq!(news.merge_calls, 2);
        assert_eq!(news.last_gap_count, 3);
        assert!((news.avg_rows_per_poll - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn override_sink_captures_events_and_restores_global() {
        metrics_reset_all();
        let sink = CaptureSink::default();

        with_metrics_sink(&sink, || {
            record(MetricsEvent::PredicateBuilt {
                category: "news",
                clauses: 2,
            });
        });
        record(MetricsEvent::PredicateBuilt {
            category: "news",
            clauses: 1,
        });

        assert_eq!(sink.seen.borrow().len(), 1);
        let counters = metrics_report(None).counters.expect("counters");
        assert_eq!(counters.ops.predicates_built, 1);
        assert_eq!(counters.ops.predicate_clauses, 1);
    }

    #[test]
    fn report_is_empty_for_a_window_that_started_later() {
        metrics_reset_all();

        let report = metrics_report(Some(u64::MAX));
        assert!(report.counters.is_none());
        assert!(report.category_counters.is_empty());
    }
}
