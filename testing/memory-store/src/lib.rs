//! In-memory, token-partitioned store for exercising the keyscan driver.
//!
//! Implements the core's `StoreClient` / `StoreSession` adapter traits over a
//! `BTreeMap` ordered by partitioner token, with session accounting and
//! scripted fault injection. Not a production adapter.

pub mod fixtures;
pub mod partitioner;
pub mod store;

pub use fixtures::{Bookmark, BookmarkFixture, bookmarks_table};
pub use partitioner::{OrderPreservingPartitioner, Partitioner, StoredKey, Xxh3Partitioner};
pub use store::{MemorySession, MemoryStore};
