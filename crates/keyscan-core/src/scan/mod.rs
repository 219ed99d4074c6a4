//! Module: scan
//! Responsibility: orchestrate fetch-page / advance-cursor / accumulate until
//! the token-ordered key space is exhausted.
//! Does not own: query rendering or store sessions (beyond scoping them).

mod accumulate;
mod cancel;
mod pages;
mod parallel;


pub use accumulate::{Accumulator, KeyCollector, KeyCounter, PageCallback, ScanReport, ScanSummary};
pub use cancel::CancelToken;
pub use pages::{Keys, Pages};
pub use parallel::{ParallelScan, RangeOutcome, SubRangeFailure};

use crate::{
    config::ScanConfig,
    cursor::ScanCursor,
    error::PartialScan,
    key::PartitionKey,
    page::Page,
    query::{QueryBuilder, TableRef},
    store::StoreClient,
    token::TokenRange,
};

///
/// DistinctKeyScan
///
/// One scan over the distinct partition keys of a table.
///
/// A scan owns exactly one cursor. Consuming the scan (through `pages`,
/// `keys`, `run` or one of the folds) starts the fetch loop; a fresh scan
/// needs a fresh cursor, or an explicit `resume` from a saved one.
///

pub struct DistinctKeyScan<'a, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    client: &'a C,
    queries: QueryBuilder,
    config: ScanConfig,
    cursor: ScanCursor<K>,
    cancel: Option<CancelToken>,
}

impl<'a, C, K> DistinctKeyScan<'a, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    /// Scan `table` from the start of the ring.
    #[must_use]
    pub fn new(client: &'a C, table: TableRef, config: ScanConfig) -> Self {
        Self::resume(client, table, config, ScanCursor::new())
    }

    /// Continue a scan from a cursor snapshot, typically one carried by a
    /// transient failure. Keys at or below the cursor are not fetched again.
    #[must_use]
    pub fn resume(
        client: &'a C,
        table: TableRef,
        config: ScanConfig,
        cursor: ScanCursor<K>,
    ) -> Self {
        let queries = QueryBuilder::new(table).with_consistency(config.consistency);

        Self {
            client,
            queries,
            config,
            cursor,
            cancel: None,
        }
    }

    /// Restrict the scan to one closed-open token range.
    #[must_use]
    pub fn with_range(mut self, range: TokenRange) -> Self {
        self.queries = self.queries.with_range(range);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub const fn cursor(&self) -> &ScanCursor<K> {
        &self.cursor
    }

    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Lazy page sequence.
    #[must_use]
    pub fn pages(self) -> Pages<'a, C, K> {
        Pages::new(
            self.client,
            self.queries,
            self.config.page_size,
            self.config.exhaustion,
            self.cursor,
            self.cancel,
        )
    }

    /// Lazy key sequence.
    #[must_use]
    pub fn keys(self) -> Keys<'a, C, K> {
        Keys::new(self.pages())
    }

    /// Drive the scan to exhaustion, folding every page into `accumulator`.
    ///
    /// Stops at the first failure of any kind and returns the partial output
    /// together with the error. A transient failure's cursor can be passed
    /// to `resume` to continue without re-reading consumed keys.
    pub fn run<A>(
        self,
        mut accumulator: A,
    ) -> Result<ScanReport<A::Output>, PartialScan<A::Output, K>>
    where
        A: Accumulator<K>,
    {
        let mut pages = self.pages();
        let mut failure = None;

        for page in pages.by_ref() {
            match page {
                Ok(page) => accumulator.accept(&page),
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        let summary = pages.summary();
        match failure {
            Some(error) => Err(PartialScan::new(accumulator.finish(), summary, error)),
            None => Ok(ScanReport::new(accumulator.finish(), summary)),
        }
    }

    /// Invoke `on_page` for every fetched page and report fetch accounting.
    pub fn scan<F>(self, on_page: F) -> Result<ScanSummary, PartialScan<ScanSummary, K>>
    where
        F: FnMut(&Page<K>),
    {
        self.run(PageCallback::new(on_page))
            .map(|report| report.summary())
            .map_err(|failure| {
                let summary = failure.summary();
                failure.map(|()| summary)
            })
    }

    /// Count distinct keys.
    pub fn count(self) -> Result<u64, PartialScan<u64, K>> {
        self.run(KeyCounter::default()).map(ScanReport::into_output)
    }

    /// Collect distinct keys in token order.
    pub fn collect_keys(self) -> Result<Vec<K>, PartialScan<Vec<K>, K>> {
        self.run(KeyCollector::default()).map(ScanReport::into_output)
    }
}
