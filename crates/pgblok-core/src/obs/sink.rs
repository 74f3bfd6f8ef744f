//! Metrics sink boundary.
//!
//! View and column code never touches `obs::metrics` directly; every
//! counter update flows through `MetricsEvent` and `MetricsSink`.

use crate::{obs::metrics, sql::DdlPhase};
use std::cell::Cell;

thread_local! {
    static SINK_OVERRIDE: Cell<Option<&'static dyn MetricsSink>> = const { Cell::new(None) };
}

///
/// ReuseKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReuseKind {
    ByName,
    ByReference,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    ViewCreated {
        view: &'a str,
    },
    ViewReused {
        view: &'a str,
        model: &'a str,
        kind: ReuseKind,
    },
    MapperBound {
        view: &'a str,
        model: &'a str,
    },
    DdlScheduled {
        view: &'a str,
        phase: DdlPhase,
    },
    Refresh {
        view: &'a str,
        concurrently: bool,
    },
    LargeObjectWrite {
        bytes: u64,
    },
    LargeObjectUnlink,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::ViewCreated { view } => {
                m.ops.views_created = m.ops.views_created.saturating_add(1);
                m.views.entry(view.to_string()).or_default();
            }
            MetricsEvent::ViewReused { view, .. } => {
                m.ops.views_reused = m.ops.views_reused.saturating_add(1);
                let entry = m.views.entry(view.to_string()).or_default();
                entry.reuses = entry.reuses.saturating_add(1);
            }
            MetricsEvent::MapperBound { view, .. } => {
                m.ops.mappers_bound = m.ops.mappers_bound.saturating_add(1);
                let entry = m.views.entry(view.to_string()).or_default();
                entry.models_bound = entry.models_bound.saturating_add(1);
            }
            MetricsEvent::DdlScheduled { .. } => {
                m.ops.ddl_scheduled = m.ops.ddl_scheduled.saturating_add(1);
            }
            MetricsEvent::Refresh { view, concurrently } => {
                m.ops.refreshes = m.ops.refreshes.saturating_add(1);
                if concurrently {
                    m.ops.concurrent_refreshes = m.ops.concurrent_refreshes.saturating_add(1);
                }
                let entry = m.views.entry(view.to_string()).or_default();
                entry.refreshes = entry.refreshes.saturating_add(1);
            }
            MetricsEvent::LargeObjectWrite { bytes } => {
                m.ops.large_object_writes = m.ops.large_object_writes.saturating_add(1);
                m.ops.large_object_bytes_written =
                    m.ops.large_object_bytes_written.saturating_add(bytes);
            }
            MetricsEvent::LargeObjectUnlink => {
                m.ops.large_object_unlinks = m.ops.large_object_unlinks.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    match SINK_OVERRIDE.with(Cell::get) {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &'static dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<&'static dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| cell.set(self.0));
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.replace(Some(sink)));
    let _guard = Guard(prev);

    f()
}
