//! Core runtime for keyscan: token-ordered distinct partition key scanning
//! over hash-partitioned column stores.
//!
//! The store itself is external. This crate owns query construction, the
//! pagination cursor, the scan driver and result accumulation.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod cursor;
pub mod error;
pub mod key;
pub mod obs;
pub mod page;
pub mod query;
pub mod scan;
pub mod store;
pub mod token;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Vocabulary needed to configure and drive a scan against an adapter.
///

pub mod prelude {
    pub use crate::{
        config::{ConsistencyLevel, ExhaustionPolicy, PageSize, ScanConfig},
        cursor::ScanCursor,
        error::{ErrorKind, PartialScan, ScanError},
        key::PartitionKey,
        page::Page,
        query::{DistinctKeyQuery, QueryBuilder, TableRef},
        scan::{
            CancelToken, DistinctKeyScan, ParallelScan, RangeOutcome, ScanReport, ScanSummary,
            SubRangeFailure,
        },
        store::{FetchError, StoreClient, StoreSession},
        token::{Token, TokenRange},
    };
}
