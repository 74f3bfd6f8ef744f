//! Observability: counters and the sink abstraction.
//!
//! Structured logs go through `tracing`; this module only owns metrics.

pub(crate) mod metrics;
pub(crate) mod sink;

pub use metrics::{EventOps, EventReport, EventState, ViewCounters};
pub use sink::{
    MetricsEvent, MetricsSink, ReuseKind, metrics_report, metrics_reset_all, with_metrics_sink,
};
