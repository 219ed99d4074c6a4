use crate::partitioner::{Partitioner, StoredKey, Xxh3Partitioner};
use keyscan_core::{
    page::Page,
    query::{DistinctKeyQuery, TableRef},
    store::{FetchError, StoreClient, StoreSession},
    token::Token,
};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use ulid::Ulid;

// (token, encoded key) keeps distinct keys apart even when tokens collide
type PartitionId = (Token, Vec<u8>);

///
/// Partition
///
/// One distinct partition key and its clustering rows.
///

#[derive(Clone, Debug)]
struct Partition<K> {
    key: K,
    rows: BTreeMap<Ulid, String>,
}

///
/// MemoryStore
///
/// In-memory single table partitioned by token. Cloning shares the data,
/// counters and fault queue.
///
/// Serves `DistinctKeyQuery` with the store-side semantics the scanner
/// relies on: partitions come back in ascending token order, bounded by
/// the cursor token, the token range and the query limit.
///

pub struct MemoryStore<K, P = Xxh3Partitioner>
where
    K: StoredKey,
    P: Partitioner,
{
    inner: Arc<StoreInner<K, P>>,
}

impl<K, P> Clone for MemoryStore<K, P>
where
    K: StoredKey,
    P: Partitioner,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<K, P> {
    table: TableRef,
    partitioner: P,
    data: RwLock<BTreeMap<PartitionId, Partition<K>>>,
    faults: Mutex<Faults>,
    executed: Mutex<Vec<DistinctKeyQuery<K>>>,
    fetch_attempts: AtomicU64,
    sessions_opened: AtomicUsize,
    sessions_released: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    // 1-based fetch attempt -> failure
    fetch: BTreeMap<u64, FetchError>,
    open: VecDeque<FetchError>,
}

impl<K: StoredKey> MemoryStore<K> {
    #[must_use]
    pub fn new(table: TableRef) -> Self {
        Self::with_partitioner(table, Xxh3Partitioner)
    }
}

impl<K, P> MemoryStore<K, P>
where
    K: StoredKey,
    P: Partitioner,
{
    #[must_use]
    pub fn with_partitioner(table: TableRef, partitioner: P) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                table,
                partitioner,
                data: RwLock::new(BTreeMap::new()),
                faults: Mutex::new(Faults::default()),
                executed: Mutex::new(Vec::new()),
                fetch_attempts: AtomicU64::new(0),
                sessions_opened: AtomicUsize::new(0),
                sessions_released: AtomicUsize::new(0),
            }),
        }
    }

    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.inner.table
    }

    #[must_use]
    pub fn token_of(&self, key: &K) -> Token {
        self.inner.token_of(key)
    }

    /// Upsert one clustering row under `key`.
    pub fn insert(&self, key: K, clustering: Ulid, value: impl Into<String>) {
        let id = self.inner.partition_id(&key);
        let mut data = self.inner.data.write().unwrap_or_else(PoisonError::into_inner);

        data.entry(id)
            .or_insert_with(|| Partition {
                key,
                rows: BTreeMap::new(),
            })
            .rows
            .insert(clustering, value.into());
    }

    /// Drop a whole partition. Returns whether it existed.
    pub fn remove(&self, key: &K) -> bool {
        let id = self.inner.partition_id(key);

        self.inner
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Number of distinct partition keys.
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.inner.read(BTreeMap::len)
    }

    /// Number of clustering rows across all partitions.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.inner
            .read(|data| data.values().map(|partition| partition.rows.len()).sum())
    }

    /// Every partition key in token order, without paging.
    #[must_use]
    pub fn keys_in_token_order(&self) -> Vec<K> {
        self.inner
            .read(|data| data.values().map(|partition| partition.key.clone()).collect())
    }

    /// Fail the `attempt`-th fetch (1-based, counted across sessions).
    pub fn fail_fetch(&self, attempt: u64, error: FetchError) {
        self.inner.faults().fetch.insert(attempt, error);
    }

    /// Fail the next session open.
    pub fn fail_next_open(&self, error: FetchError) {
        self.inner.faults().open.push_back(error);
    }

    #[must_use]
    pub fn fetch_attempts(&self) -> u64 {
        self.inner.fetch_attempts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.inner.sessions_opened.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sessions_released(&self) -> usize {
        self.inner.sessions_released.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet dropped.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.sessions_opened()
            .saturating_sub(self.sessions_released())
    }

    /// Every query executed so far, failed ones included.
    #[must_use]
    pub fn executed(&self) -> Vec<DistinctKeyQuery<K>> {
        self.inner
            .executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<K, P> StoreInner<K, P>
where
    K: StoredKey,
    P: Partitioner,
{
    fn token_of(&self, key: &K) -> Token {
        self.partitioner.token(&key.key_bytes())
    }

    fn partition_id(&self, key: &K) -> PartitionId {
        let bytes = key.key_bytes();

        (self.partitioner.token(&bytes), bytes)
    }

    fn read<T>(&self, f: impl FnOnce(&BTreeMap<PartitionId, Partition<K>>) -> T) -> T {
        f(&self.data.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, query: &DistinctKeyQuery<K>) -> Result<Page<K>, FetchError> {
        let attempt = self.fetch_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());

        if let Some(error) = self.faults().fetch.remove(&attempt) {
            return Err(error);
        }
        if query.table() != &self.table {
            return Err(FetchError::fatal(format!(
                "unconfigured table {}",
                query.table().qualified_name()
            )));
        }

        // token(key) > token(:cursor), else token(key) >= :range_start
        let floor = match query.cursor_key() {
            Some(key) => match self.token_of(key).get().checked_add(1) {
                Some(next) => Token::new(next),
                None => return Ok(Page::empty()),
            },
            None => query.range_start().unwrap_or(Token::MIN),
        };
        let end = query.range_end();

        let keys = self.read(|data| {
            data.range((floor, Vec::new())..)
                .take_while(|((token, _), _)| end.is_none_or(|end| *token < end))
                .take(query.limit().as_usize())
                .map(|(_, partition)| partition.key.clone())
                .collect()
        });

        Ok(Page::new(keys))
    }
}

impl<K, P> StoreClient<K> for MemoryStore<K, P>
where
    K: StoredKey,
    P: Partitioner,
{
    type Session = MemorySession<K, P>;

    fn open_session(&self) -> Result<Self::Session, FetchError> {
        if let Some(error) = self.inner.faults().open.pop_front() {
            return Err(error);
        }
        self.inner.sessions_opened.fetch_add(1, Ordering::SeqCst);

        Ok(MemorySession {
            inner: Arc::clone(&self.inner),
        })
    }
}

///
/// MemorySession
///
/// Counts itself released on drop.
///

pub struct MemorySession<K, P>
where
    K: StoredKey,
    P: Partitioner,
{
    inner: Arc<StoreInner<K, P>>,
}

impl<K, P> StoreSession<K> for MemorySession<K, P>
where
    K: StoredKey,
    P: Partitioner,
{
    fn execute(&mut self, query: &DistinctKeyQuery<K>) -> Result<Page<K>, FetchError> {
        self.inner.execute(query)
    }
}

impl<K, P> Drop for MemorySession<K, P>
where
    K: StoredKey,
    P: Partitioner,
{
    fn drop(&mut self) {
        self.inner.sessions_released.fetch_add(1, Ordering::SeqCst);
    }
}

///
/// TESTS
///
