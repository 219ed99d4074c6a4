//! Module: token
//! Responsibility: partitioner token values and closed-open token ranges.
//! Does not own: the hash function itself (that belongs to the store).

use crate::error::InvalidArgument;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Token
///
/// Hash-derived, totally ordered position of a partition key on the ring.
/// Only the ordering relation is meaningful.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Token(i64);

impl Token {
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for Token {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// TokenRange
///
/// Closed-open interval `[start, end)` over the token ring.
/// `end == None` runs through `Token::MAX` inclusive.
///
/// Sub-range scans rely on ranges produced by `split` being disjoint and
/// contiguous, so every key lands in exactly one of them.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TokenRange {
    start: Token,
    end: Option<Token>,
}

impl TokenRange {
    /// The whole ring.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            start: Token::MIN,
            end: None,
        }
    }

    pub fn new(start: Token, end: Option<Token>) -> Result<Self, InvalidArgument> {
        if let Some(end) = end
            && end <= start
        {
            return Err(InvalidArgument::new(format!(
                "token range end {end} must be greater than start {start}"
            )));
        }

        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> Token {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Option<Token> {
        self.end
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.start.0 == i64::MIN && self.end.is_none()
    }

    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        token >= self.start && self.end.is_none_or(|end| token < end)
    }

    /// Partition this range into at most `parts` disjoint, contiguous
    /// sub-ranges. Fewer ranges come back when the range holds fewer tokens
    /// than requested parts.
    pub fn split(&self, parts: usize) -> Result<Vec<Self>, InvalidArgument> {
        if parts == 0 {
            return Err(InvalidArgument::new("token range split count must be >= 1"));
        }

        let lo = i128::from(self.start.0);
        let hi = self
            .end
            .map_or(i128::from(i64::MAX) + 1, |end| i128::from(end.0));
        let span = hi - lo;
        let parts = i128::try_from(parts).unwrap_or(i128::MAX).min(span);
        let step = span / parts;
        let remainder = span % parts;

        // The first `remainder` ranges absorb one extra token each.
        let boundary = |index: i128| -> Result<Token, InvalidArgument> {
            let offset = index * step + index.min(remainder);
            i64::try_from(lo + offset)
                .map(Token)
                .map_err(|_| InvalidArgument::new("token range split boundary out of range"))
        };

        let mut ranges = Vec::new();
        for index in 0..parts {
            let start = boundary(index)?;
            let end = if index + 1 == parts {
                self.end
            } else {
                Some(boundary(index + 1)?)
            };
            ranges.push(Self { start, end });
        }

        Ok(ranges)
    }
}

impl Default for TokenRange {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {end})", self.start),
            None => write!(f, "[{}, {}]", self.start, Token::MAX),
        }
    }
}

///
/// TESTS
///
