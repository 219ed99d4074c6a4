//! Module: query
//! Responsibility: construct the bounded distinct-key query for the next page.
//! Does not own: query execution or cursor mutation.
//!
//! Shape, with the optional parts driven by cursor and token range:
//!
//! ```text
//! SELECT DISTINCT <key> FROM <keyspace>.<table>
//! [WHERE token(<key>) > token(:cursor) | token(<key>) >= :range_start]
//! [AND token(<key>) < :range_end]
//! LIMIT <page size>
//! ```

#[cfg(test)]
mod tests;

use crate::{
    config::{ConsistencyLevel, PageSize},
    cursor::ScanCursor,
    error::InvalidArgument,
    key::PartitionKey,
    token::{Token, TokenRange},
};
use std::{fmt, sync::Arc};

///
/// TableRef
///
/// Fully qualified table plus the partition key column being enumerated.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TableRef {
    keyspace: String,
    table: String,
    key_column: String,
}

impl TableRef {
    pub fn new(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        key_column: impl Into<String>,
    ) -> Result<Self, InvalidArgument> {
        let table_ref = Self {
            keyspace: keyspace.into(),
            table: table.into(),
            key_column: key_column.into(),
        };

        for (label, ident) in [
            ("keyspace", &table_ref.keyspace),
            ("table", &table_ref.table),
            ("key column", &table_ref.key_column),
        ] {
            if ident.trim().is_empty() {
                return Err(InvalidArgument::new(format!("{label} name must not be empty")));
            }
        }

        Ok(table_ref)
    }

    #[must_use]
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// `keyspace.table`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }
}

///
/// DistinctKeyQuery
///
/// One page request. Rendered CQL uses named bind markers; bind values are
/// exposed through accessors so the adapter can bind them natively.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistinctKeyQuery<K> {
    table: Arc<TableRef>,
    after: Option<K>,
    range: Option<TokenRange>,
    limit: PageSize,
    consistency: ConsistencyLevel,
}

impl<K: PartitionKey> DistinctKeyQuery<K> {
    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// `:cursor` bind value; present for every page after the first.
    #[must_use]
    pub const fn cursor_key(&self) -> Option<&K> {
        self.after.as_ref()
    }

    /// `:range_start` bind value. Only the first page of a sub-range scan
    /// uses it; later pages are bounded below by the cursor instead.
    #[must_use]
    pub fn range_start(&self) -> Option<Token> {
        if self.after.is_some() {
            return None;
        }

        self.range.map(|range| range.start())
    }

    /// `:range_end` bind value (exclusive).
    #[must_use]
    pub fn range_end(&self) -> Option<Token> {
        self.range.and_then(|range| range.end())
    }

    #[must_use]
    pub const fn range(&self) -> Option<TokenRange> {
        self.range
    }

    #[must_use]
    pub const fn limit(&self) -> PageSize {
        self.limit
    }

    #[must_use]
    pub const fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    /// Logical CQL text of this query.
    #[must_use]
    pub fn cql(&self) -> String {
        self.to_string()
    }
}

impl<K: PartitionKey> fmt::Display for DistinctKeyQuery<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = self.table.key_column();
        write!(
            f,
            "SELECT DISTINCT {column} FROM {}",
            self.table.qualified_name()
        )?;

        let mut predicates = Vec::with_capacity(2);
        if self.after.is_some() {
            predicates.push(format!("token({column}) > token(:cursor)"));
        } else if self.range_start().is_some() {
            predicates.push(format!("token({column}) >= :range_start"));
        }
        if self.range_end().is_some() {
            predicates.push(format!("token({column}) < :range_end"));
        }
        if !predicates.is_empty() {
            write!(f, " WHERE {}", predicates.join(" AND "))?;
        }

        write!(f, " LIMIT {}", self.limit)
    }
}

///
/// QueryBuilder
///
/// Pure constructor for page queries against one table.
///
/// This builder:
/// - Binds the table, consistency level and optional token range once
/// - Derives each page query from the cursor state alone
/// - Has no side effects and never touches the store
///

#[derive(Clone, Debug)]
pub struct QueryBuilder {
    table: Arc<TableRef>,
    consistency: ConsistencyLevel,
    range: Option<TokenRange>,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(table: TableRef) -> Self {
        Self {
            table: Arc::new(table),
            consistency: ConsistencyLevel::default(),
            range: None,
        }
    }

    #[must_use]
    pub fn with_consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = consistency;
        self
    }

    /// Restrict queries to one closed-open token range. The full ring is
    /// treated as no restriction at all.
    #[must_use]
    pub fn with_range(mut self, range: TokenRange) -> Self {
        self.range = (!range.is_full()).then_some(range);
        self
    }

    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    #[must_use]
    pub const fn range(&self) -> Option<TokenRange> {
        self.range
    }

    /// Build the query for the page that follows `cursor`.
    #[must_use]
    pub fn build<K: PartitionKey>(
        &self,
        cursor: &ScanCursor<K>,
        page_size: PageSize,
    ) -> DistinctKeyQuery<K> {
        DistinctKeyQuery {
            table: Arc::clone(&self.table),
            after: cursor.last_key().cloned(),
            range: self.range,
            limit: page_size,
            consistency: self.consistency,
        }
    }
}
