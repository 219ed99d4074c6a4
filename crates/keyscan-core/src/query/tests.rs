use crate::{
    config::{ConsistencyLevel, PageSize},
    cursor::ScanCursor,
    page::Page,
    query::{QueryBuilder, TableRef},
    token::{Token, TokenRange},
};

fn bookmarks() -> TableRef {
    TableRef::new("demo", "user_bookmarks", "user_id").expect("table ref should build")
}

fn page_size(n: u32) -> PageSize {
    PageSize::new(n).expect("page size should be valid")
}

#[test]
fn first_page_query_is_unbounded() {
    let query = QueryBuilder::new(bookmarks()).build(&ScanCursor::<i64>::new(), page_size(1_000));

    assert_eq!(
        query.cql(),
        "SELECT DISTINCT user_id FROM demo.user_bookmarks LIMIT 1000"
    );
    assert_eq!(query.cursor_key(), None);
    assert_eq!(query.range_start(), None);
    assert_eq!(query.range_end(), None);
}

#[test]
fn continuation_query_excludes_tokens_at_or_below_cursor() {
    let mut cursor = ScanCursor::new();
    cursor
        .advance(&Page::new(vec![10_i64, 20]))
        .expect("advance should succeed");
    let query = QueryBuilder::new(bookmarks()).build(&cursor, page_size(2));

    assert_eq!(
        query.cql(),
        "SELECT DISTINCT user_id FROM demo.user_bookmarks WHERE token(user_id) > token(:cursor) LIMIT 2"
    );
    assert_eq!(query.cursor_key(), Some(&20));
}

#[test]
fn build_is_pure_and_repeatable() {
    let builder = QueryBuilder::new(bookmarks());
    let cursor = ScanCursor::resume_after(7_i64);

    assert_eq!(
        builder.build(&cursor, page_size(5)),
        builder.build(&cursor, page_size(5)),
        "identical inputs must produce identical queries"
    );
}

#[test]
fn consistency_level_is_passed_through() {
    let query = QueryBuilder::new(bookmarks())
        .with_consistency(ConsistencyLevel::Quorum)
        .build(&ScanCursor::<i64>::new(), page_size(1));

    assert_eq!(query.consistency(), ConsistencyLevel::Quorum);
}

#[test]
fn sub_range_first_page_is_closed_open() {
    let range = TokenRange::new(Token::new(-100), Some(Token::new(100))).expect("valid range");
    let query = QueryBuilder::new(bookmarks())
        .with_range(range)
        .build(&ScanCursor::<i64>::new(), page_size(10));

    assert_eq!(
        query.cql(),
        "SELECT DISTINCT user_id FROM demo.user_bookmarks WHERE token(user_id) >= :range_start AND token(user_id) < :range_end LIMIT 10"
    );
    assert_eq!(query.range_start(), Some(Token::new(-100)));
    assert_eq!(query.range_end(), Some(Token::new(100)));
}

#[test]
fn sub_range_continuation_drops_range_start() {
    let range = TokenRange::new(Token::new(-100), Some(Token::new(100))).expect("valid range");
    let query = QueryBuilder::new(bookmarks())
        .with_range(range)
        .build(&ScanCursor::resume_after(3_i64), page_size(10));

    assert_eq!(
        query.cql(),
        "SELECT DISTINCT user_id FROM demo.user_bookmarks WHERE token(user_id) > token(:cursor) AND token(user_id) < :range_end LIMIT 10"
    );
    assert_eq!(query.range_start(), None);
}

#[test]
fn open_ended_sub_range_has_no_upper_bound() {
    let range = TokenRange::new(Token::new(0), None).expect("valid range");
    let query = QueryBuilder::new(bookmarks())
        .with_range(range)
        .build(&ScanCursor::<i64>::new(), page_size(10));

    assert_eq!(
        query.cql(),
        "SELECT DISTINCT user_id FROM demo.user_bookmarks WHERE token(user_id) >= :range_start LIMIT 10"
    );
}

#[test]
fn full_ring_range_is_no_restriction() {
    let builder = QueryBuilder::new(bookmarks()).with_range(TokenRange::full());

    assert_eq!(builder.range(), None);
}

#[test]
fn table_ref_rejects_blank_identifiers() {
    let err = TableRef::new("demo", " ", "user_id").expect_err("blank table must fail");

    assert_eq!(err.reason(), "table name must not be empty");
}
