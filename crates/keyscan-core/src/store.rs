//! Module: store
//! Responsibility: the adapter boundary between the scan driver and a
//! hash-partitioned store.
//! Does not own: connection lifecycle, authentication, or consistency
//! semantics. Those live behind the adapter.

use crate::{key::PartitionKey, page::Page, query::DistinctKeyQuery};
use std::fmt;
use thiserror::Error as ThisError;

///
/// FetchErrorClass
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FetchErrorClass {
    /// Network, timeout or unavailable replicas; the same query may succeed.
    Transient,

    /// The store rejected the query; retrying cannot help.
    Fatal,
}

impl fmt::Display for FetchErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

///
/// FetchError
///
/// Failure reported by a store adapter for one session open or query.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct FetchError {
    pub class: FetchErrorClass,
    pub message: String,
}

impl FetchError {
    pub fn new(class: FetchErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FetchErrorClass::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FetchErrorClass::Fatal, message)
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.class, FetchErrorClass::Transient)
    }
}

///
/// StoreSession
///
/// A scoped store connection. Dropping the session releases it; the driver
/// drops it on exhaustion, failure, cancellation and abandonment alike.
///

pub trait StoreSession<K: PartitionKey> {
    /// Execute one distinct-key query and return its page, ordered by
    /// ascending token and never longer than the query limit.
    fn execute(&mut self, query: &DistinctKeyQuery<K>) -> Result<Page<K>, FetchError>;
}

///
/// StoreClient
///
/// Factory for store sessions. Implementations must return identical pages
/// for identical queries against an unmodified dataset.
///

pub trait StoreClient<K: PartitionKey> {
    type Session: StoreSession<K>;

    fn open_session(&self) -> Result<Self::Session, FetchError>;
}
