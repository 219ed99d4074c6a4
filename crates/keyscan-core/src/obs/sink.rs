//! Metrics sink boundary.
//!
//! Scan logic MUST NOT touch obs::metrics directly.
//! All instrumentation flows through ScanEvent and MetricsSink.
//!
//! Overrides are per thread. Sub-range workers running on other threads
//! report into the global counters.
use crate::{obs::metrics, store::FetchErrorClass};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// ScanOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanOutcome {
    Completed,
    Failed,
    Cancelled,
    Abandoned,
}

///
/// ScanEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanEvent {
    ScanStart,
    PageFetched {
        keys: u64,
    },
    FetchFailed {
        class: FetchErrorClass,
    },
    ScanFinish {
        fetches: u64,
        keys: u64,
        outcome: ScanOutcome,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: ScanEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the process-wide counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: ScanEvent) {
        match event {
            ScanEvent::ScanStart => {
                metrics::with_state_mut(|m| {
                    m.scans_started = m.scans_started.saturating_add(1);
                });
            }

            ScanEvent::PageFetched { keys } => {
                metrics::with_state_mut(|m| {
                    m.fetches = m.fetches.saturating_add(1);
                    m.keys_emitted = m.keys_emitted.saturating_add(keys);
                    if keys == 0 {
                        m.empty_pages = m.empty_pages.saturating_add(1);
                    }
                });
            }

            ScanEvent::FetchFailed { class } => {
                metrics::with_state_mut(|m| match class {
                    FetchErrorClass::Transient => {
                        m.transient_failures = m.transient_failures.saturating_add(1);
                    }
                    FetchErrorClass::Fatal => {
                        m.fatal_failures = m.fatal_failures.saturating_add(1);
                    }
                });
            }

            ScanEvent::ScanFinish {
                fetches, outcome, ..
            } => {
                metrics::with_state_mut(|m| {
                    match outcome {
                        ScanOutcome::Completed => {
                            m.scans_completed = m.scans_completed.saturating_add(1);
                        }
                        ScanOutcome::Failed => m.scans_failed = m.scans_failed.saturating_add(1),
                        ScanOutcome::Cancelled => {
                            m.scans_cancelled = m.scans_cancelled.saturating_add(1);
                        }
                        ScanOutcome::Abandoned => {
                            m.scans_abandoned = m.scans_abandoned.saturating_add(1);
                        }
                    }
                    m.max_fetches_per_scan = m.max_fetches_per_scan.max(fetches);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: ScanEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // Preconditions:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`.
        // - `with_metrics_sink` always restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        //
        // Aliasing:
        // - Only a shared reference is materialized, matching the shared borrow
        //   used to install the override.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the process-wide scan counters.
#[must_use]
pub fn metrics_report() -> metrics::ScanCounters {
    metrics::with_state(Clone::clone)
}

/// Reset the process-wide scan counters.
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
    // Preconditions:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` always restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    //
    // What would break this:
    // - Any deferred use of `sink_ptr` beyond this scope.
    // - Any path that bypasses Guard restoration.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}

/// ScanSpan
/// RAII guard that emits start/finish events for one driver run.
/// A span dropped without an outcome is reported as abandoned.

pub(crate) struct ScanSpan {
    fetches: u64,
    keys: u64,
    outcome: Option<ScanOutcome>,
    finished: bool,
}

impl ScanSpan {
    #[must_use]
    pub(crate) fn new() -> Self {
        record(ScanEvent::ScanStart);

        Self {
            fetches: 0,
            keys: 0,
            outcome: None,
            finished: false,
        }
    }

    /// Span for a scan with nothing left to fetch; it records no events.
    #[must_use]
    pub(crate) const fn inert() -> Self {
        Self {
            fetches: 0,
            keys: 0,
            outcome: None,
            finished: true,
        }
    }

    pub(crate) fn page(&mut self, keys: usize) {
        let keys = u64::try_from(keys).unwrap_or(u64::MAX);
        self.fetches = self.fetches.saturating_add(1);
        self.keys = self.keys.saturating_add(keys);

        record(ScanEvent::PageFetched { keys });
    }

    /// A transient failure leaves the outcome open: the scan may still be
    /// retried, or dropped and reported as abandoned.
    pub(crate) fn fetch_failed(&mut self, class: FetchErrorClass) {
        if class == FetchErrorClass::Fatal {
            self.outcome = Some(ScanOutcome::Failed);
        }

        record(ScanEvent::FetchFailed { class });
    }

    pub(crate) const fn set_outcome(&mut self, outcome: ScanOutcome) {
        self.outcome = Some(outcome);
    }

    /// Emit the finish event now; later calls and the drop are no-ops.
    pub(crate) fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        record(ScanEvent::ScanFinish {
            fetches: self.fetches,
            keys: self.keys,
            outcome: self.outcome.unwrap_or(ScanOutcome::Abandoned),
        });
    }
}

impl Drop for ScanSpan {
    fn drop(&mut self) {
        self.finish();
    }
}

///
/// TESTS
///
