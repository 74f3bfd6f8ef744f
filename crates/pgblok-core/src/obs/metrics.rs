use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for view and large-object operations.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub views: BTreeMap<String, ViewCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Registry build
    pub views_created: u64,
    pub views_reused: u64,
    pub mappers_bound: u64,
    pub ddl_scheduled: u64,

    // Refresh
    pub refreshes: u64,
    pub concurrent_refreshes: u64,

    // Large objects
    pub large_object_writes: u64,
    pub large_object_bytes_written: u64,
    pub large_object_unlinks: u64,
}

///
/// ViewCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ViewCounters {
    pub models_bound: u64,
    pub reuses: u64,
    pub refreshes: u64,
}

///
/// EventReport
/// Point-in-time snapshot handed to callers.
///

pub type EventReport = EventState;

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Snapshot the current counters.
#[must_use]
pub(crate) fn report() -> EventReport {
    with_state(Clone::clone)
}
