use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

///
/// ScanCounters
/// Process-wide, in-memory counters for scan activity.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScanCounters {
    // Driver runs
    pub scans_started: u64,
    pub scans_completed: u64,
    pub scans_failed: u64,
    pub scans_cancelled: u64,
    pub scans_abandoned: u64,

    // Fetches
    pub fetches: u64,
    pub empty_pages: u64,
    pub keys_emitted: u64,
    pub max_fetches_per_scan: u64,

    // Adapter failures
    pub transient_failures: u64,
    pub fatal_failures: u64,
}

impl ScanCounters {
    const fn new() -> Self {
        Self {
            scans_started: 0,
            scans_completed: 0,
            scans_failed: 0,
            scans_cancelled: 0,
            scans_abandoned: 0,
            fetches: 0,
            empty_pages: 0,
            keys_emitted: 0,
            max_fetches_per_scan: 0,
            transient_failures: 0,
            fatal_failures: 0,
        }
    }
}

static SCAN_COUNTERS: Mutex<ScanCounters> = Mutex::new(ScanCounters::new());

/// Borrow counters immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&ScanCounters) -> R) -> R {
    let guard = SCAN_COUNTERS.lock().unwrap_or_else(PoisonError::into_inner);
    f(&guard)
}

/// Borrow counters mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut ScanCounters) -> R) -> R {
    let mut guard = SCAN_COUNTERS.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = ScanCounters::new());
}
