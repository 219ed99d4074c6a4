use keyscan_core::{prelude::*, scan::KeyCounter};
use keyscan_testing_memory_store::{MemoryStore, OrderPreservingPartitioner};
use ulid::Ulid;

const KEYS: u64 = 5_000;

// Sequential keys under an order-preserving partitioner all land in the
// first few thousand tokens of the ring.
fn clustered_store() -> MemoryStore<u64, OrderPreservingPartitioner> {
    let table = TableRef::new("demo", "user_bookmarks", "user_id").expect("table ref");
    let store = MemoryStore::with_partitioner(table, OrderPreservingPartitioner);
    for key in 0..KEYS {
        store.insert(key, Ulid::from_parts(key, 0), "row");
    }

    store
}

fn config(page_size: u32) -> ScanConfig {
    ScanConfig::with_page_size_of(page_size).expect("page size")
}

#[test]
fn clustered_tokens_do_not_change_page_accounting() {
    let store = clustered_store();

    let summary = DistinctKeyScan::new(&store, store.table().clone(), config(100))
        .scan(|page| assert!(page.len() <= 100))
        .expect("scan should complete");

    assert_eq!(summary.fetches, KEYS / 100 + 1);
    assert_eq!(summary.keys, KEYS);
}

#[test]
fn clustered_keys_fall_into_one_sub_range() {
    let store = clustered_store();
    let scan = ParallelScan::new(&store, store.table().clone(), config(100), 8)
        .expect("split count");

    let report = scan.run(KeyCounter::default).expect("parallel scan");
    let (per_range, summary) = report.into_parts();

    assert_eq!(per_range[0], KEYS);
    assert!(per_range[1..].iter().all(|count| *count == 0));
    // 50 full pages + 1 empty in the first range, one empty page elsewhere.
    assert_eq!(summary.fetches, KEYS / 100 + 1 + 7);
    assert_eq!(store.open_sessions(), 0);
}

#[test]
fn keys_straddling_a_split_boundary_are_seen_once() {
    let table = TableRef::new("demo", "user_bookmarks", "user_id").expect("table ref");
    let store = MemoryStore::with_partitioner(table.clone(), OrderPreservingPartitioner);
    // i64 keys map onto the ring in numeric order, so 0 is the midpoint.
    for key in -50_i64..50 {
        store.insert(key, Ulid::from_parts(key.unsigned_abs(), 0), "row");
    }

    let keys = ParallelScan::new(&store, table, config(7), 2)
        .expect("split count")
        .collect_keys()
        .expect("parallel scan");

    assert_eq!(keys, (-50_i64..50).collect::<Vec<_>>());
}
