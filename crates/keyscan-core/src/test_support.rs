//! In-crate fake store for driver tests.
//!
//! Keys are `i64` and each key is its own token, so token order is plain
//! numeric order and range bounds can be checked by eye.

use crate::{
    page::Page,
    query::{DistinctKeyQuery, TableRef},
    store::{FetchError, StoreClient, StoreSession},
};
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

pub(crate) fn bookmarks() -> TableRef {
    TableRef::new("demo", "user_bookmarks", "user_id").expect("table ref should build")
}

///
/// FakeStore
///

#[derive(Clone, Default)]
pub(crate) struct FakeStore {
    inner: Arc<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    keys: Vec<i64>,
    overflow: bool,
    // fetch attempt (1-based, counted across sessions) -> injected failure
    faults: Mutex<BTreeMap<u64, FetchError>>,
    open_faults: Mutex<Vec<FetchError>>,
    attempts: AtomicU64,
    opened: AtomicUsize,
    closed: AtomicUsize,
    executed: Mutex<Vec<DistinctKeyQuery<i64>>>,
}

impl FakeStore {
    /// Store holding the distinct keys `0..count`.
    pub(crate) fn with_keys(count: i64) -> Self {
        Self::from_keys((0..count).collect())
    }

    pub(crate) fn from_keys(mut keys: Vec<i64>) -> Self {
        keys.sort_unstable();
        keys.dedup();

        Self {
            inner: Arc::new(FakeInner {
                keys,
                ..FakeInner::default()
            }),
        }
    }

    /// Every page returns one key more than the query limit allows.
    pub(crate) fn overflowing(count: i64) -> Self {
        Self {
            inner: Arc::new(FakeInner {
                keys: (0..count).collect(),
                overflow: true,
                ..FakeInner::default()
            }),
        }
    }

    /// Fail the `attempt`-th fetch (1-based) with `error`.
    pub(crate) fn fail_fetch(self, attempt: u64, error: FetchError) -> Self {
        self.inner
            .faults
            .lock()
            .expect("fault lock")
            .insert(attempt, error);
        self
    }

    /// Fail the next session open with `error`.
    pub(crate) fn fail_open(self, error: FetchError) -> Self {
        self.inner
            .open_faults
            .lock()
            .expect("fault lock")
            .push(error);
        self
    }

    pub(crate) fn fetch_attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn sessions_opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn sessions_closed(&self) -> usize {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn open_sessions(&self) -> usize {
        self.sessions_opened() - self.sessions_closed()
    }

    pub(crate) fn executed(&self) -> Vec<DistinctKeyQuery<i64>> {
        self.inner.executed.lock().expect("query log lock").clone()
    }
}

impl StoreClient<i64> for FakeStore {
    type Session = FakeSession;

    fn open_session(&self) -> Result<FakeSession, FetchError> {
        if let Some(error) = self.inner.open_faults.lock().expect("fault lock").pop() {
            return Err(error);
        }
        self.inner.opened.fetch_add(1, Ordering::SeqCst);

        Ok(FakeSession {
            inner: Arc::clone(&self.inner),
        })
    }
}

///
/// FakeSession
///

pub(crate) struct FakeSession {
    inner: Arc<FakeInner>,
}

impl StoreSession<i64> for FakeSession {
    fn execute(&mut self, query: &DistinctKeyQuery<i64>) -> Result<Page<i64>, FetchError> {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .executed
            .lock()
            .expect("query log lock")
            .push(query.clone());

        if let Some(error) = self.inner.faults.lock().expect("fault lock").remove(&attempt) {
            return Err(error);
        }

        let after = query.cursor_key().copied();
        let start = query.range_start().map(|token| token.get());
        let end = query.range_end().map(|token| token.get());
        let limit = query.limit().as_usize() + usize::from(self.inner.overflow);

        let keys = self
            .inner
            .keys
            .iter()
            .copied()
            .filter(|key| after.is_none_or(|after| *key > after))
            .filter(|key| start.is_none_or(|start| *key >= start))
            .filter(|key| end.is_none_or(|end| *key < end))
            .take(limit)
            .collect();

        Ok(Page::new(keys))
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }
}
