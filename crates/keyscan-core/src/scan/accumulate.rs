//! Module: scan::accumulate
//! Responsibility: fold fetched pages into caller-facing results.
//! Does not own: fetching, cursor state, or page ordering.

use crate::{key::PartitionKey, page::Page};
use serde::Serialize;
use std::{fmt::Debug, marker::PhantomData};

///
/// ScanSummary
///
/// Fetch accounting for one scan. `fetches` counts successful fetches,
/// including the terminating empty page.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ScanSummary {
    pub fetches: u64,
    pub keys: u64,
}

impl ScanSummary {
    /// Combine the accounting of two disjoint scans.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            fetches: self.fetches.saturating_add(other.fetches),
            keys: self.keys.saturating_add(other.keys),
        }
    }
}

///
/// ScanReport
///
/// Completed scan: accumulator output plus fetch accounting.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanReport<T> {
    output: T,
    summary: ScanSummary,
}

impl<T> ScanReport<T> {
    #[must_use]
    pub const fn new(output: T, summary: ScanSummary) -> Self {
        Self { output, summary }
    }

    #[must_use]
    pub const fn output(&self) -> &T {
        &self.output
    }

    #[must_use]
    pub const fn summary(&self) -> ScanSummary {
        self.summary
    }

    #[must_use]
    pub fn into_output(self) -> T {
        self.output
    }

    /// Consume this report and return `(output, summary)`.
    #[must_use]
    pub fn into_parts(self) -> (T, ScanSummary) {
        (self.output, self.summary)
    }
}

///
/// Accumulator
///
/// Folds pages in scan order. `finish` runs on success and on failure, so
/// a failed scan still hands back everything accumulated so far.
///

pub trait Accumulator<K: PartitionKey> {
    type Output: Debug;

    fn accept(&mut self, page: &Page<K>);

    fn finish(self) -> Self::Output;
}

///
/// KeyCounter
///

#[derive(Clone, Copy, Debug, Default)]
pub struct KeyCounter {
    count: u64,
}

impl<K: PartitionKey> Accumulator<K> for KeyCounter {
    type Output = u64;

    fn accept(&mut self, page: &Page<K>) {
        let len = u64::try_from(page.len()).unwrap_or(u64::MAX);
        self.count = self.count.saturating_add(len);
    }

    fn finish(self) -> u64 {
        self.count
    }
}

///
/// KeyCollector
///
/// Collects keys in scan (token) order.
///

#[derive(Clone, Debug)]
pub struct KeyCollector<K> {
    keys: Vec<K>,
}

impl<K> Default for KeyCollector<K> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<K: PartitionKey> Accumulator<K> for KeyCollector<K> {
    type Output = Vec<K>;

    fn accept(&mut self, page: &Page<K>) {
        self.keys.extend_from_slice(page.keys());
    }

    fn finish(self) -> Vec<K> {
        self.keys
    }
}

///
/// PageCallback
///
/// Hands every page, the terminating empty one included, to a closure.
///

pub struct PageCallback<F, K> {
    on_page: F,
    _marker: PhantomData<fn(&Page<K>)>,
}

impl<F, K> PageCallback<F, K>
where
    F: FnMut(&Page<K>),
    K: PartitionKey,
{
    pub const fn new(on_page: F) -> Self {
        Self {
            on_page,
            _marker: PhantomData,
        }
    }
}

impl<F, K> Accumulator<K> for PageCallback<F, K>
where
    F: FnMut(&Page<K>),
    K: PartitionKey,
{
    type Output = ();

    fn accept(&mut self, page: &Page<K>) {
        (self.on_page)(page);
    }

    fn finish(self) {}
}
