//! Module: scan::parallel
//! Responsibility: split one logical scan into disjoint token sub-ranges and
//! run them on the rayon pool.
//! Does not own: the per-range fetch loop (each sub-range is a plain
//! `DistinctKeyScan` with its own cursor and session).

use crate::{
    config::ScanConfig,
    cursor::ScanCursor,
    error::{InvalidArgument, PartialScan, ScanError},
    key::PartitionKey,
    query::TableRef,
    scan::{
        Accumulator, CancelToken, DistinctKeyScan, KeyCollector, KeyCounter, ScanReport,
        ScanSummary,
    },
    store::StoreClient,
    token::TokenRange,
};
use rayon::prelude::*;
use std::{fmt::Debug, marker::PhantomData};
use tracing::{info, warn};

/// Failure of a sub-range scan: every range's outcome, in range order, with
/// the first error in range order as the cause.
pub type SubRangeFailure<T, K> = PartialScan<Vec<RangeOutcome<T, K>>, K>;

///
/// RangeOutcome
///
/// What one sub-range produced: its output (complete or partial), its fetch
/// accounting, and the error that stopped it, if any. The error's cursor
/// belongs to this range, so `resume` continues exactly where it stopped.
///

#[derive(Debug)]
pub struct RangeOutcome<T, K: PartitionKey> {
    range: TokenRange,
    output: T,
    summary: ScanSummary,
    error: Option<ScanError<K>>,
}

impl<T, K: PartitionKey> RangeOutcome<T, K> {
    #[must_use]
    pub const fn range(&self) -> TokenRange {
        self.range
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
    pub const fn error(&self) -> Option<&ScanError<K>> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn into_output(self) -> T {
        self.output
    }

    /// Scan that finishes this range from its failure cursor.
    ///
    /// `None` when the range completed or its error carries no cursor.
    #[must_use]
    pub fn resume<'a, C>(
        &self,
        client: &'a C,
        table: TableRef,
        config: ScanConfig,
    ) -> Option<DistinctKeyScan<'a, C, K>>
    where
        C: StoreClient<K>,
    {
        let cursor: ScanCursor<K> = self.error.as_ref()?.cursor()?.clone();

        Some(DistinctKeyScan::resume(client, table, config, cursor).with_range(self.range))
    }
}

impl<T: Debug, K: PartitionKey> SubRangeFailure<T, K> {
    /// Outcomes of the ranges that did not complete.
    pub fn failed_ranges(&self) -> impl Iterator<Item = &RangeOutcome<T, K>> {
        self.partial().iter().filter(|outcome| !outcome.is_complete())
    }
}

///
/// ParallelScan
///
/// Sub-range scan over closed-open token ranges. Range order is token
/// order, so per-range outputs are returned (and merged) in global token
/// order. Each range has its own cursor; no state is shared between them.
///

pub struct ParallelScan<'a, C, K>
where
    C: StoreClient<K> + Sync,
    K: PartitionKey,
{
    client: &'a C,
    table: TableRef,
    config: ScanConfig,
    ranges: Vec<TokenRange>,
    cancel: Option<CancelToken>,
    _marker: PhantomData<fn() -> K>,
}

impl<'a, C, K> ParallelScan<'a, C, K>
where
    C: StoreClient<K> + Sync,
    K: PartitionKey,
{
    /// Split the whole ring into `splits` sub-ranges.
    pub fn new(
        client: &'a C,
        table: TableRef,
        config: ScanConfig,
        splits: usize,
    ) -> Result<Self, InvalidArgument> {
        Self::over_range(client, table, config, TokenRange::full(), splits)
    }

    /// Split `range` into `splits` sub-ranges.
    pub fn over_range(
        client: &'a C,
        table: TableRef,
        config: ScanConfig,
        range: TokenRange,
        splits: usize,
    ) -> Result<Self, InvalidArgument> {
        Ok(Self {
            client,
            table,
            config,
            ranges: range.split(splits)?,
            cancel: None,
            _marker: PhantomData,
        })
    }

    /// Share one cancellation signal across all sub-range scans.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn ranges(&self) -> &[TokenRange] {
        &self.ranges
    }

    /// Run every sub-range with a fresh accumulator from `make`.
    ///
    /// Outputs come back one per range, in range order. When any range
    /// fails, every range's outcome (complete or partial, with its range
    /// and error) is returned; the first failure in range order is the cause.
    pub fn run<A, F>(
        &self,
        make: F,
    ) -> Result<ScanReport<Vec<A::Output>>, SubRangeFailure<A::Output, K>>
    where
        A: Accumulator<K>,
        A::Output: Send,
        F: Fn() -> A + Sync,
    {
        let outcomes: Vec<RangeOutcome<A::Output, K>> = self
            .ranges
            .par_iter()
            .map(|range| {
                let scan = DistinctKeyScan::new(self.client, self.table.clone(), self.config)
                    .with_range(*range);
                let scan = match &self.cancel {
                    Some(cancel) => scan.with_cancel(cancel.clone()),
                    None => scan,
                };

                match scan.run(make()) {
                    Ok(report) => {
                        let (output, summary) = report.into_parts();
                        RangeOutcome {
                            range: *range,
                            output,
                            summary,
                            error: None,
                        }
                    }
                    Err(failure) => {
                        let (output, summary, error) = failure.into_parts();
                        warn!(range = ?range, error = %error, "sub-range scan stopped");
                        RangeOutcome {
                            range: *range,
                            output,
                            summary,
                            error: Some(error),
                        }
                    }
                }
            })
            .collect();

        let summary = outcomes
            .iter()
            .fold(ScanSummary::default(), |total, outcome| {
                total.merge(outcome.summary)
            });
        let first_error = outcomes.iter().find_map(|outcome| outcome.error.clone());

        info!(
            table = %self.table.qualified_name(),
            ranges = self.ranges.len(),
            failed = outcomes.iter().filter(|outcome| !outcome.is_complete()).count(),
            fetches = summary.fetches,
            keys = summary.keys,
            "sub-range scan finished"
        );

        match first_error {
            Some(error) => Err(PartialScan::new(outcomes, summary, error)),
            None => Ok(ScanReport::new(
                outcomes.into_iter().map(RangeOutcome::into_output).collect(),
                summary,
            )),
        }
    }

    /// Count distinct keys across all sub-ranges.
    pub fn count(&self) -> Result<u64, SubRangeFailure<u64, K>> {
        self.run(KeyCounter::default)
            .map(|report| report.into_output().into_iter().sum())
    }

    /// Collect distinct keys across all sub-ranges, in token order.
    pub fn collect_keys(&self) -> Result<Vec<K>, SubRangeFailure<Vec<K>, K>> {
        self.run(KeyCollector::default)
            .map(|report| report.into_output().into_iter().flatten().collect())
    }
}
