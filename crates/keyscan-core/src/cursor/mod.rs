//! Module: cursor
//! Responsibility: resumable scan position (last key observed, exhaustion).
//! Does not own: query shapes or fetch execution.
//!
//! The cursor never rewinds. Every query built from it strictly excludes
//! tokens at or below the last key's token, which is what keeps a key from
//! reappearing in a later page.

#[cfg(test)]
mod tests;

use crate::{error::InvalidState, key::PartitionKey, page::Page};

///
/// ScanCursor
///
/// Mutable scan state owned by exactly one driver. Cloning produces an
/// independent snapshot (used by failures to report the resume position).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanCursor<K> {
    last_key: Option<K>,
    exhausted: bool,
    pages_seen: u64,
}

impl<K: PartitionKey> ScanCursor<K> {
    /// Fresh cursor positioned before the first token.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_key: None,
            exhausted: false,
            pages_seen: 0,
        }
    }

    /// Cursor positioned strictly after `key`.
    #[must_use]
    pub const fn resume_after(key: K) -> Self {
        Self {
            last_key: Some(key),
            exhausted: false,
            pages_seen: 0,
        }
    }

    #[must_use]
    pub const fn last_key(&self) -> Option<&K> {
        self.last_key.as_ref()
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Pages absorbed by this cursor, including the terminating empty one.
    #[must_use]
    pub const fn pages_seen(&self) -> u64 {
        self.pages_seen
    }

    /// Absorb one fetched page.
    ///
    /// A non-empty page moves `last_key` to its last (token-maximal) key.
    /// An empty page marks the cursor exhausted and leaves `last_key` alone.
    pub fn advance(&mut self, page: &Page<K>) -> Result<(), InvalidState> {
        if self.exhausted {
            return Err(InvalidState::AdvanceAfterExhaustion {
                pages_seen: self.pages_seen,
            });
        }

        self.pages_seen = self.pages_seen.saturating_add(1);
        match page.last() {
            Some(last) => self.last_key = Some(last.clone()),
            None => self.exhausted = true,
        }

        Ok(())
    }

    // Short-page exhaustion: the page was already absorbed by `advance`.
    pub(crate) const fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }
}

impl<K: PartitionKey> Default for ScanCursor<K> {
    fn default() -> Self {
        Self::new()
    }
}
