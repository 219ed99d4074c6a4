use crate::{cursor::ScanCursor, error::InvalidState, page::Page};

#[test]
fn fresh_cursor_has_no_key_and_is_live() {
    let cursor = ScanCursor::<i64>::new();

    assert_eq!(cursor.last_key(), None);
    assert!(!cursor.is_exhausted());
    assert_eq!(cursor.pages_seen(), 0);
}

#[test]
fn advance_with_non_empty_page_moves_to_last_key() {
    let mut cursor = ScanCursor::new();
    cursor
        .advance(&Page::new(vec![3_i64, 8, 11]))
        .expect("advance should succeed");

    assert_eq!(cursor.last_key(), Some(&11));
    assert!(!cursor.is_exhausted(), "a full page must not imply exhaustion");
    assert_eq!(cursor.pages_seen(), 1);
}

#[test]
fn advance_with_empty_page_exhausts_and_keeps_last_key() {
    let mut cursor = ScanCursor::new();
    cursor
        .advance(&Page::new(vec![5_i64]))
        .expect("first advance should succeed");
    cursor
        .advance(&Page::empty())
        .expect("empty-page advance should succeed");

    assert!(cursor.is_exhausted());
    assert_eq!(
        cursor.last_key(),
        Some(&5),
        "exhaustion must not clear the last observed key"
    );
    assert_eq!(cursor.pages_seen(), 2);
}

#[test]
fn advance_after_exhaustion_is_invalid_state() {
    let mut cursor = ScanCursor::<i64>::new();
    cursor
        .advance(&Page::empty())
        .expect("empty-page advance should succeed");

    let err = cursor
        .advance(&Page::new(vec![1]))
        .expect_err("advancing an exhausted cursor must fail");

    assert_eq!(err, InvalidState::AdvanceAfterExhaustion { pages_seen: 1 });
    assert_eq!(cursor.last_key(), None, "failed advance must not mutate state");
}

#[test]
fn resume_after_positions_cursor_past_key() {
    let cursor = ScanCursor::resume_after(42_i64);

    assert_eq!(cursor.last_key(), Some(&42));
    assert!(!cursor.is_exhausted());
}

#[test]
fn clones_are_independent_snapshots() {
    let mut cursor = ScanCursor::new();
    cursor
        .advance(&Page::new(vec![1_i64, 2]))
        .expect("advance should succeed");
    let snapshot = cursor.clone();
    cursor
        .advance(&Page::new(vec![9]))
        .expect("advance should succeed");

    assert_eq!(snapshot.last_key(), Some(&2));
    assert_eq!(cursor.last_key(), Some(&9));
}
