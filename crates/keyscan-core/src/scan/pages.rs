//! Module: scan::pages
//! Responsibility: the fetch / advance loop, one page per `next` call.
//! Does not own: query text, accumulation, or retry policy.

use crate::{
    config::{ExhaustionPolicy, PageSize},
    cursor::ScanCursor,
    error::{InvalidState, ScanError},
    key::PartitionKey,
    obs::{ScanOutcome, ScanSpan},
    page::Page,
    query::QueryBuilder,
    scan::{CancelToken, ScanSummary},
    store::{FetchError, StoreClient, StoreSession},
};
use tracing::{debug, info, warn};

///
/// Pages
///
/// Lazy, finite, non-restartable sequence of pages for one scan.
///
/// Each `next` builds the query from the current cursor, executes it, and
/// advances the cursor only after the fetch fully succeeded. The terminating
/// empty page is yielded too; `None` follows it.
///
/// A transient failure leaves the iterator live with its cursor unchanged,
/// so calling `next` again retries the identical query. Fatal failures,
/// contract violations and cancellation fuse the iterator.
///

pub struct Pages<'a, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    client: &'a C,
    queries: QueryBuilder,
    page_size: PageSize,
    exhaustion: ExhaustionPolicy,
    cursor: ScanCursor<K>,
    cancel: Option<CancelToken>,
    session: Option<C::Session>,
    summary: ScanSummary,
    span: ScanSpan,
    fused: bool,
}

impl<'a, C, K> Pages<'a, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    pub(crate) fn new(
        client: &'a C,
        queries: QueryBuilder,
        page_size: PageSize,
        exhaustion: ExhaustionPolicy,
        cursor: ScanCursor<K>,
        cancel: Option<CancelToken>,
    ) -> Self {
        // Nothing is left to fetch, so no scan is started.
        let span = if cursor.is_exhausted() {
            ScanSpan::inert()
        } else {
            ScanSpan::new()
        };

        Self {
            client,
            queries,
            page_size,
            exhaustion,
            cursor,
            cancel,
            session: None,
            summary: ScanSummary::default(),
            span,
            fused: false,
        }
    }

    /// Current scan position.
    #[must_use]
    pub const fn cursor(&self) -> &ScanCursor<K> {
        &self.cursor
    }

    /// Fetch accounting so far.
    #[must_use]
    pub const fn summary(&self) -> ScanSummary {
        self.summary
    }

    /// True once the key space was exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    /// Whether a store session is currently held.
    #[must_use]
    pub const fn holds_session(&self) -> bool {
        self.session.is_some()
    }

    /// Stop the scan and keep its position.
    #[must_use]
    pub fn into_cursor(mut self) -> ScanCursor<K> {
        self.release_session();
        std::mem::take(&mut self.cursor)
    }

    // Open the session lazily, on the first fetch or after a transient failure.
    fn session(&mut self) -> Result<&mut C::Session, FetchError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let session = self.client.open_session()?;
                debug!(
                    table = %self.queries.table().qualified_name(),
                    "store session opened"
                );
                session
            }
        };

        Ok(self.session.insert(session))
    }

    fn release_session(&mut self) {
        if self.session.take().is_some() {
            debug!(
                table = %self.queries.table().qualified_name(),
                "store session released"
            );
        }
    }

    // Terminal transition shared by every fused exit.
    fn fuse(&mut self, outcome: ScanOutcome) {
        self.fused = true;
        self.release_session();
        self.span.set_outcome(outcome);
        self.span.finish();
    }

    fn fetch(&mut self) -> Result<Page<K>, ScanError<K>> {
        let query = self.queries.build(&self.cursor, self.page_size);
        let result = self.session().and_then(|session| session.execute(&query));

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                self.span.fetch_failed(err.class);
                let error = ScanError::from_fetch(self.cursor.clone(), err);
                if error.is_retriable() {
                    // Reconnect on retry; the cursor stays where it was.
                    self.release_session();
                    warn!(
                        error = %error,
                        pages_seen = self.cursor.pages_seen(),
                        "transient fetch failure, cursor preserved"
                    );
                } else {
                    warn!(error = %error, cql = %query, "fatal fetch failure, scan aborted");
                    self.fuse(ScanOutcome::Failed);
                }

                return Err(error);
            }
        };

        if page.len() > self.page_size.as_usize() {
            self.fuse(ScanOutcome::Failed);

            return Err(InvalidState::PageOverflow {
                limit: self.page_size.get(),
                len: page.len(),
            }
            .into());
        }

        if let Err(err) = self.cursor.advance(&page) {
            self.fuse(ScanOutcome::Failed);

            return Err(err.into());
        }
        if self.exhaustion == ExhaustionPolicy::ShortPageTerminates
            && !page.is_empty()
            && page.len() < self.page_size.as_usize()
        {
            self.cursor.mark_exhausted();
        }

        self.summary.fetches = self.summary.fetches.saturating_add(1);
        self.summary.keys = self
            .summary
            .keys
            .saturating_add(u64::try_from(page.len()).unwrap_or(u64::MAX));
        self.span.page(page.len());
        debug!(
            fetch = self.summary.fetches,
            keys = page.len(),
            limit = self.page_size.get(),
            "page fetched"
        );

        if self.cursor.is_exhausted() {
            info!(
                table = %self.queries.table().qualified_name(),
                fetches = self.summary.fetches,
                keys = self.summary.keys,
                "distinct key scan complete"
            );
            self.fuse(ScanOutcome::Completed);
        }

        Ok(page)
    }
}

impl<C, K> Iterator for Pages<'_, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    type Item = Result<Page<K>, ScanError<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused || self.cursor.is_exhausted() {
            return None;
        }

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            debug!(
                pages_seen = self.cursor.pages_seen(),
                "distinct key scan cancelled"
            );
            self.fuse(ScanOutcome::Cancelled);

            return Some(Err(ScanError::Cancelled {
                cursor: self.cursor.clone(),
            }));
        }

        Some(self.fetch())
    }
}

impl<C, K> std::iter::FusedIterator for Pages<'_, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
}

///
/// Keys
///
/// Pages flattened into single keys. Errors pass through unchanged and
/// follow the same retry/fuse rules as `Pages`.
///

pub struct Keys<'a, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    pages: Pages<'a, C, K>,
    current: std::vec::IntoIter<K>,
}

impl<'a, C, K> Keys<'a, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    pub(crate) fn new(pages: Pages<'a, C, K>) -> Self {
        Self {
            pages,
            current: Vec::new().into_iter(),
        }
    }

    /// Position of the last fetched page (keys of that page may still be
    /// buffered).
    #[must_use]
    pub const fn cursor(&self) -> &ScanCursor<K> {
        self.pages.cursor()
    }

    #[must_use]
    pub const fn summary(&self) -> ScanSummary {
        self.pages.summary()
    }
}

impl<C, K> Iterator for Keys<'_, C, K>
where
    C: StoreClient<K>,
    K: PartitionKey,
{
    type Item = Result<K, ScanError<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.current.next() {
                return Some(Ok(key));
            }

            match self.pages.next()? {
                Ok(page) => self.current = page.into_keys().into_iter(),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
