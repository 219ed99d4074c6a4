use crate::{cursor::ScanCursor, key::PartitionKey, scan::ScanSummary, store::FetchError};
use std::fmt::{self, Debug};
use thiserror::Error as ThisError;

///
/// ErrorKind
///
/// Stable classification of every way a scan can stop short of exhaustion.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Caller passed a value outside the accepted domain; no fetch ran.
    InvalidArgument,

    /// Scan state machine or adapter contract was violated.
    InvalidState,

    /// Adapter failed in a retriable way; the cursor is unchanged.
    TransientFetchFailure,

    /// Adapter failed in a non-retriable way; the scan is aborted.
    FatalFetchFailure,

    /// Caller cancelled the scan between two fetches.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidState => "InvalidState",
            Self::TransientFetchFailure => "TransientFetchFailure",
            Self::FatalFetchFailure => "FatalFetchFailure",
            Self::Cancelled => "Cancelled",
        };

        f.write_str(label)
    }
}

///
/// InvalidArgument
///
/// Rejected caller input (page size, table identifiers, split counts).
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("invalid argument: {reason}")]
pub struct InvalidArgument {
    reason: String,
}

impl InvalidArgument {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

///
/// InvalidState
///
/// Programmer or adapter contract errors detected while driving a cursor.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum InvalidState {
    #[error("invalid state: cursor advanced after exhaustion ({pages_seen} pages absorbed)")]
    AdvanceAfterExhaustion { pages_seen: u64 },

    #[error("invalid state: store returned {len} keys for a page limited to {limit}")]
    PageOverflow { limit: u32, len: usize },
}

///
/// ScanError
///
/// Failure surfaced by the scan driver. Fetch and cancellation failures
/// carry a snapshot of the cursor taken at the moment of failure, which is
/// the position to resume from.
///

#[derive(Clone, Debug, ThisError)]
pub enum ScanError<K: PartitionKey> {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    #[error(transparent)]
    InvalidState(#[from] InvalidState),

    #[error("transient fetch failure: {source}")]
    TransientFetch {
        cursor: ScanCursor<K>,
        source: FetchError,
    },

    #[error("fatal fetch failure: {source}")]
    FatalFetch {
        cursor: ScanCursor<K>,
        source: FetchError,
    },

    #[error("scan cancelled")]
    Cancelled { cursor: ScanCursor<K> },
}

impl<K: PartitionKey> ScanError<K> {
    /// Classify a fetch error by its retriability.
    pub(crate) fn from_fetch(cursor: ScanCursor<K>, source: FetchError) -> Self {
        if source.is_transient() {
            Self::TransientFetch { cursor, source }
        } else {
            Self::FatalFetch { cursor, source }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::TransientFetch { .. } => ErrorKind::TransientFetchFailure,
            Self::FatalFetch { .. } => ErrorKind::FatalFetchFailure,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::TransientFetch { .. })
    }

    /// Cursor snapshot for fetch and cancellation failures.
    #[must_use]
    pub const fn cursor(&self) -> Option<&ScanCursor<K>> {
        match self {
            Self::TransientFetch { cursor, .. }
            | Self::FatalFetch { cursor, .. }
            | Self::Cancelled { cursor } => Some(cursor),
            Self::InvalidArgument(_) | Self::InvalidState(_) => None,
        }
    }

    /// Consume the error and keep only its cursor snapshot.
    #[must_use]
    pub fn into_cursor(self) -> Option<ScanCursor<K>> {
        match self {
            Self::TransientFetch { cursor, .. }
            | Self::FatalFetch { cursor, .. }
            | Self::Cancelled { cursor } => Some(cursor),
            Self::InvalidArgument(_) | Self::InvalidState(_) => None,
        }
    }
}

///
/// PartialScan
///
/// A scan that stopped early: the accumulated output up to the last
/// successful page, the fetch summary, and the reason it stopped.
///

#[derive(Debug, ThisError)]
#[error(
    "scan stopped after {} keys in {} fetches: {error}",
    .summary.keys,
    .summary.fetches
)]
pub struct PartialScan<T: Debug, K: PartitionKey> {
    partial: T,
    summary: ScanSummary,
    #[source]
    error: ScanError<K>,
}

impl<T: Debug, K: PartitionKey> PartialScan<T, K> {
    #[must_use]
    pub const fn new(partial: T, summary: ScanSummary, error: ScanError<K>) -> Self {
        Self {
            partial,
            summary,
            error,
        }
    }

    #[must_use]
    pub const fn partial(&self) -> &T {
        &self.partial
    }

    #[must_use]
    pub const fn summary(&self) -> ScanSummary {
        self.summary
    }

    #[must_use]
    pub const fn error(&self) -> &ScanError<K> {
        &self.error
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Consume this failure and return `(partial, summary, error)`.
    #[must_use]
    pub fn into_parts(self) -> (T, ScanSummary, ScanError<K>) {
        (self.partial, self.summary, self.error)
    }

    /// Transform the partial output while keeping summary and error.
    #[must_use]
    pub fn map<U: Debug>(self, f: impl FnOnce(T) -> U) -> PartialScan<U, K> {
        PartialScan {
            partial: f(self.partial),
            summary: self.summary,
            error: self.error,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_are_classified_by_retriability() {
        let transient = ScanError::from_fetch(
            ScanCursor::<i64>::resume_after(4),
            FetchError::transient("read timeout"),
        );
        let fatal = ScanError::from_fetch(
            ScanCursor::<i64>::new(),
            FetchError::fatal("unconfigured table"),
        );

        assert_eq!(transient.kind(), ErrorKind::TransientFetchFailure);
        assert!(transient.is_retriable());
        assert_eq!(
            transient.cursor().and_then(ScanCursor::last_key),
            Some(&4),
            "transient failures must carry the cursor snapshot"
        );
        assert_eq!(fatal.kind(), ErrorKind::FatalFetchFailure);
        assert!(!fatal.is_retriable());
    }

    #[test]
    fn argument_and_state_errors_carry_no_cursor() {
        let err: ScanError<i64> = InvalidArgument::new("page size must be >= 1").into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.cursor().is_none());

        let err: ScanError<i64> = InvalidState::AdvanceAfterExhaustion { pages_seen: 2 }.into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.into_cursor().is_none());
    }

    #[test]
    fn partial_scan_display_reports_progress_and_cause() {
        let failure = PartialScan::new(
            7_u64,
            ScanSummary {
                fetches: 2,
                keys: 7,
            },
            ScanError::<i64>::from_fetch(ScanCursor::new(), FetchError::fatal("query rejected")),
        );

        assert_eq!(
            failure.to_string(),
            "scan stopped after 7 keys in 2 fetches: fatal fetch failure: query rejected"
        );
        assert_eq!(failure.map(|n| n * 2).partial(), &14);
    }
}
