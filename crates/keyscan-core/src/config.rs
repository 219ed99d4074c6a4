//! Module: config
//! Responsibility: scan driver options and their validation.
//! Does not own: adapter connection settings or retry policy.

use crate::error::InvalidArgument;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// PageSize
///
/// Number of distinct keys requested per fetch. Always `>= 1`; an invalid
/// value is rejected here, before any query is constructed.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    pub const DEFAULT: Self = Self(1_000);
    pub const MAX: Self = Self(u32::MAX);

    pub fn new(size: u32) -> Result<Self, InvalidArgument> {
        if size == 0 {
            return Err(InvalidArgument::new("page size must be >= 1"));
        }

        Ok(Self(size))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Page size as a collection length.
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for PageSize {
    type Error = InvalidArgument;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl TryFrom<i64> for PageSize {
    type Error = InvalidArgument;

    fn try_from(size: i64) -> Result<Self, Self::Error> {
        let size = u32::try_from(size).map_err(|_| {
            InvalidArgument::new(format!("page size must be in 1..={}, got {size}", u32::MAX))
        })?;

        Self::new(size)
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.0
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// ConsistencyLevel
///
/// Per-query replica agreement level. Forwarded verbatim to the store
/// adapter; the scan algorithm never interprets it.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    #[default]
    LocalOne,
}

impl ConsistencyLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
            Self::LocalOne => "LOCAL_ONE",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ExhaustionPolicy
///
/// How the driver decides that the key space is exhausted.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Only an empty page ends the scan. A full or short page is always
    /// followed by one more fetch.
    #[default]
    ConfirmWithEmptyPage,

    /// A non-empty page shorter than the page size also ends the scan,
    /// saving the trailing empty fetch.
    ShortPageTerminates,
}

///
/// ScanConfig
///
/// Options recognized by the scan driver.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub page_size: PageSize,
    pub consistency: ConsistencyLevel,
    pub exhaustion: ExhaustionPolicy,
}

impl ScanConfig {
    /// Build a config with the given page size and default everything else.
    pub fn with_page_size_of(size: u32) -> Result<Self, InvalidArgument> {
        Ok(Self::default().with_page_size(PageSize::new(size)?))
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub const fn with_consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = consistency;
        self
    }

    #[must_use]
    pub const fn with_exhaustion(mut self, exhaustion: ExhaustionPolicy) -> Self {
        self.exhaustion = exhaustion;
        self
    }
}

///
/// TESTS
///
