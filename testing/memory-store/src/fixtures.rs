//! Seeded user-bookmark fixtures.
//!
//! Randomness is always injected: callers pass the generator (or a seed),
//! so every fixture is reproducible.

use crate::{partitioner::Partitioner, store::MemoryStore};
use keyscan_core::{error::InvalidArgument, query::TableRef};
use rand_chacha::{ChaCha8Rng, rand_core::*};
use std::collections::HashSet;
use ulid::Ulid;

pub const KEYSPACE: &str = "demo";
pub const TABLE: &str = "user_bookmarks";
pub const KEY_COLUMN: &str = "user_id";

/// Bookmark targets; duplicates are deliberate.
pub const URLS: [&str; 9] = [
    "https://www.github.com",
    "https://www.google.com",
    "https://www.twitter.com",
    "https://www.yahoo.com",
    "https://www.topcoder.com",
    "https://www.twitter.com",
    "https://delicio.us",
    "https://www.wikipedia.com",
    "https://www.nasa.gov",
];

/// Rows per user are drawn from `1..=MAX_ROWS_PER_USER`.
pub const MAX_ROWS_PER_USER: u64 = 5;

// 2024-01-01T00:00:00Z; keeps clustering ulids stable across runs.
const BASE_TIMESTAMP_MS: u64 = 1_704_067_200_000;

/// `demo.user_bookmarks`, partitioned by `user_id`.
pub fn bookmarks_table() -> Result<TableRef, InvalidArgument> {
    TableRef::new(KEYSPACE, TABLE, KEY_COLUMN)
}

///
/// Bookmark
///
/// One clustering row: `user_id` partition, `timestamp` clustering column.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bookmark {
    pub user_id: Ulid,
    pub timestamp: Ulid,
    pub url: &'static str,
}

///
/// BookmarkFixture
///

#[derive(Clone, Debug)]
pub struct BookmarkFixture {
    users: Vec<Ulid>,
    bookmarks: Vec<Bookmark>,
}

impl BookmarkFixture {
    /// Generate `users` distinct users, each with one to five bookmarks.
    #[must_use]
    pub fn generate(rng: &mut ChaCha8Rng, users: usize) -> Self {
        let mut fixture = Self {
            users: Vec::with_capacity(users),
            bookmarks: Vec::new(),
        };

        let mut seen = HashSet::with_capacity(users);
        let mut clock = BASE_TIMESTAMP_MS;
        while fixture.users.len() < users {
            let user_id = random_ulid(rng, BASE_TIMESTAMP_MS);
            if !seen.insert(user_id) {
                continue;
            }
            fixture.users.push(user_id);

            let rows = 1 + rng.next_u64() % MAX_ROWS_PER_USER;
            for _ in 0..rows {
                clock += 1;
                fixture.bookmarks.push(Bookmark {
                    user_id,
                    timestamp: random_ulid(rng, clock),
                    url: pick_url(rng),
                });
            }
        }

        fixture
    }

    /// `generate` with a ChaCha8 generator seeded from `seed`.
    #[must_use]
    pub fn seeded(seed: u64, users: usize) -> Self {
        Self::generate(&mut ChaCha8Rng::seed_from_u64(seed), users)
    }

    /// Distinct users in generation order.
    #[must_use]
    pub fn users(&self) -> &[Ulid] {
        &self.users
    }

    #[must_use]
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Insert every bookmark row into `store`.
    pub fn populate<P: Partitioner>(&self, store: &MemoryStore<Ulid, P>) {
        for bookmark in &self.bookmarks {
            store.insert(bookmark.user_id, bookmark.timestamp, bookmark.url);
        }
    }

    /// A fresh xxh3-partitioned store on `table` holding this fixture.
    #[must_use]
    pub fn store(&self, table: TableRef) -> MemoryStore<Ulid> {
        let store = MemoryStore::new(table);
        self.populate(&store);

        store
    }
}

fn random_ulid(rng: &mut ChaCha8Rng, timestamp_ms: u64) -> Ulid {
    let random = (u128::from(rng.next_u64()) << 64) | u128::from(rng.next_u64());

    Ulid::from_parts(timestamp_ms, random)
}

fn pick_url(rng: &mut ChaCha8Rng) -> &'static str {
    let index = rng.next_u64() % URLS.len() as u64;

    URLS[usize::try_from(index).unwrap_or_default()]
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_fixture() {
        let a = BookmarkFixture::seeded(7, 50);
        let b = BookmarkFixture::seeded(7, 50);

        assert_eq!(a.users(), b.users());
        assert_eq!(a.bookmarks(), b.bookmarks());
    }

    #[test]
    fn every_user_has_one_to_five_bookmarks() {
        let fixture = BookmarkFixture::seeded(11, 200);

        for user in fixture.users() {
            let rows = fixture
                .bookmarks()
                .iter()
                .filter(|bookmark| bookmark.user_id == *user)
                .count();
            assert!((1..=5).contains(&rows), "{user} has {rows} bookmarks");
        }
    }

    #[test]
    fn bookmarks_point_at_the_demo_urls() {
        let fixture = BookmarkFixture::seeded(13, 300);

        assert!(fixture.bookmarks().iter().all(|bookmark| URLS.contains(&bookmark.url)));
        assert!(URLS.contains(&"https://www.wikipedia.com"));
        assert_eq!(
            URLS.iter().filter(|url| **url == "https://www.twitter.com").count(),
            2
        );
    }

    #[test]
    fn store_holds_one_partition_per_user() {
        let fixture = BookmarkFixture::seeded(3, 120);
        let store = fixture.store(bookmarks_table().expect("fixture table"));

        assert_eq!(store.partition_count(), 120);
        assert_eq!(store.row_count(), fixture.bookmarks().len());
    }
}
