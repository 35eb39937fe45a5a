//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Gap-set and tracker logic records [`MetricsEvent`]s through the sink
//! boundary only; nothing outside `obs` touches the counters directly.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{CategoryCounters, CategorySummary, EventOps, EventReport, EventState};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
