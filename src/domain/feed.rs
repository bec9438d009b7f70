//! The photo feed cursor.
//!
//! `PhotoFeed` owns the queue of loaded media, the session-wide set of seen
//! ids and the pagination state of the media source. It never talks to the
//! source itself: scheduling a fetch places a [`PageRequest`] in the outbox,
//! the host performs the call and hands the outcome back through
//! [`PhotoFeed::receive_page`].

use super::MediaItem;
use crate::error::{PhotoBurnError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Prefetch fires once fewer than this many items wait behind the active card.
pub const LOOKAHEAD_THRESHOLD: usize = 10;

/// Items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Opaque continuation value handed out by a media source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(pub String);

/// A page fetch the host must perform against the media source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub after: Option<PageToken>,
    pub page_size: usize,
}

impl PageRequest {
    /// The first request of a session has no token and must confirm permission.
    pub fn is_first(&self) -> bool {
        self.after.is_none()
    }
}

/// A page as delivered to the feed
#[derive(Debug, Clone, Default)]
pub struct MediaPage {
    pub items: Vec<MediaItem>,
    pub next: Option<PageToken>,
    pub has_more: bool,
}

/// Result of moving the read cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The item now under the cursor.
    Item(MediaItem),
    /// The queue ran dry but the source has more pages.
    Waiting,
    /// The queue is exhausted and the source has nothing left.
    EndOfFeed,
}

/// Coarse feed state for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Loading,
    Ready,
    PermissionDenied,
    /// The last fetch failed and nothing is queued; an explicit request retries.
    Failed,
    /// The library holds no media at all.
    Empty,
    /// Every loaded item has been reviewed and the source is drained.
    Finished,
}

#[derive(Debug)]
pub struct PhotoFeed {
    queue: Vec<MediaItem>,
    cursor: usize,
    seen: HashSet<String>,
    continuation: Option<PageToken>,
    has_more: bool,
    fetch_in_flight: bool,
    permission_denied: bool,
    last_error: Option<String>,
    outbox: Option<PageRequest>,
    page_size: usize,
    lookahead_threshold: usize,
    rng: StdRng,
}

impl PhotoFeed {
    /// Creates an empty feed whose batch shuffles are driven by `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates an empty feed with an OS-seeded shuffle
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            queue: Vec::new(),
            cursor: 0,
            seen: HashSet::new(),
            continuation: None,
            has_more: true,
            fetch_in_flight: false,
            permission_denied: false,
            last_error: None,
            outbox: None,
            page_size: DEFAULT_PAGE_SIZE,
            lookahead_threshold: LOOKAHEAD_THRESHOLD,
            rng,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_lookahead_threshold(mut self, threshold: usize) -> Self {
        self.lookahead_threshold = threshold;
        self
    }

    /// Schedules a fetch of the next page.
    ///
    /// Returns `false` without doing anything when a fetch is already pending
    /// or the source reported no more pages. An explicit call also lifts the
    /// prefetch suspension left behind by a permission denial.
    pub fn request_page(&mut self) -> bool {
        if self.fetch_in_flight {
            debug!("Page fetch already in flight, ignoring request");
            return false;
        }
        if !self.has_more {
            debug!("Media source drained, ignoring request");
            return false;
        }

        self.permission_denied = false;
        self.last_error = None;
        self.fetch_in_flight = true;
        self.outbox = Some(PageRequest {
            after: self.continuation.clone(),
            page_size: self.page_size,
        });
        debug!(first = self.continuation.is_none(), "Scheduled page fetch");
        true
    }

    /// Hands the scheduled request to the host, at most once
    pub fn take_request(&mut self) -> Option<PageRequest> {
        self.outbox.take()
    }

    /// Applies the outcome of a fetch and clears the in-flight guard
    pub fn receive_page(&mut self, outcome: Result<MediaPage>) {
        self.fetch_in_flight = false;
        self.outbox = None;

        match outcome {
            Ok(page) => {
                self.last_error = None;
                let received = page.items.len();
                let seen = &mut self.seen;
                let mut fresh: Vec<MediaItem> = page
                    .items
                    .into_iter()
                    .filter(|item| seen.insert(item.id.clone()))
                    .collect();
                fresh.shuffle(&mut self.rng);

                let added = fresh.len();
                self.queue.extend(fresh);
                self.continuation = page.next;
                self.has_more = page.has_more;

                info!(
                    received,
                    added,
                    queued = self.queue.len(),
                    has_more = self.has_more,
                    "Loaded media page"
                );

                self.maybe_prefetch();
            }
            Err(PhotoBurnError::PermissionDenied) => {
                self.permission_denied = true;
                warn!("Media library permission denied, feed stays empty until retried");
            }
            Err(e) => {
                warn!(error = %e, "Media page fetch failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Moves the cursor forward by one and reports what is now under it
    pub fn advance(&mut self) -> Advance {
        if self.cursor < self.queue.len() {
            self.cursor += 1;
        }

        let result = match self.queue.get(self.cursor) {
            Some(item) => Advance::Item(item.clone()),
            None if self.has_more => Advance::Waiting,
            None => Advance::EndOfFeed,
        };

        self.maybe_prefetch();
        result
    }

    pub fn peek_current(&self) -> Option<&MediaItem> {
        self.queue.get(self.cursor)
    }

    pub fn peek_next(&self) -> Option<&MediaItem> {
        self.queue.get(self.cursor + 1)
    }

    /// Items not yet consumed, the active one included
    pub fn remaining(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Items waiting behind the active card
    pub fn lookahead(&self) -> usize {
        self.remaining().saturating_sub(1)
    }

    pub fn needs_prefetch(&self) -> bool {
        !self.fetch_in_flight
            && self.has_more
            && !self.permission_denied
            && self.lookahead() < self.lookahead_threshold
    }

    fn maybe_prefetch(&mut self) {
        if self.needs_prefetch() {
            debug!(lookahead = self.lookahead(), "Lookahead low, prefetching");
            self.request_page();
        }
    }

    pub fn status(&self) -> FeedStatus {
        if self.peek_current().is_some() {
            FeedStatus::Ready
        } else if self.permission_denied {
            FeedStatus::PermissionDenied
        } else if self.last_error.is_some() && !self.fetch_in_flight {
            FeedStatus::Failed
        } else if !self.has_more {
            if self.queue.is_empty() {
                FeedStatus::Empty
            } else {
                FeedStatus::Finished
            }
        } else {
            FeedStatus::Loading
        }
    }

    /// True once the cursor reached the end and no further pages exist
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.queue.len() && !self.has_more
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.queue
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn is_permission_denied(&self) -> bool {
        self.permission_denied
    }

    /// Message of the most recent failed fetch, cleared by the next request
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn continuation(&self) -> Option<&PageToken> {
        self.continuation.as_ref()
    }
}

impl Default for PhotoFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaKind;
    use chrono::Utc;
    use rand::Rng;

    fn item(id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            uri: format!("file:///photos/{}.jpg", id),
            kind: MediaKind::Photo,
            created_at: Utc::now(),
            display_name: format!("{}.jpg", id),
        }
    }

    fn page(ids: &[&str], next: Option<&str>, has_more: bool) -> MediaPage {
        MediaPage {
            items: ids.iter().map(|id| item(id)).collect(),
            next: next.map(|t| PageToken(t.to_string())),
            has_more,
        }
    }

    fn numbered(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn page_of(ids: &[String], next: Option<&str>, has_more: bool) -> MediaPage {
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        page(&refs, next, has_more)
    }

    /// Feeds `first` through the initial request so the feed starts populated
    fn loaded_feed(first: MediaPage) -> PhotoFeed {
        let mut feed = PhotoFeed::with_seed(7);
        assert!(feed.request_page());
        feed.take_request().unwrap();
        feed.receive_page(Ok(first));
        feed
    }

    mod request_tests {
        use super::*;

        #[test]
        fn test_first_request_has_no_token() {
            let mut feed = PhotoFeed::with_seed(1);

            assert!(feed.request_page());
            let request = feed.take_request().unwrap();

            assert!(request.is_first());
            assert_eq!(request.page_size, DEFAULT_PAGE_SIZE);
            assert!(feed.is_fetch_in_flight());
        }

        #[test]
        fn test_request_is_noop_while_in_flight() {
            let mut feed = PhotoFeed::with_seed(1);

            assert!(feed.request_page());
            assert!(!feed.request_page());
            assert!(!feed.request_page());

            assert!(feed.take_request().is_some());
            assert!(feed.take_request().is_none());
        }

        #[test]
        fn test_request_is_noop_when_drained() {
            let mut feed = loaded_feed(page(&["a"], None, false));

            assert!(!feed.request_page());
            assert!(feed.take_request().is_none());
            assert!(!feed.is_fetch_in_flight());
        }

        #[test]
        fn test_next_request_carries_continuation() {
            let ids = numbered("p", 20);
            let mut feed = loaded_feed(page_of(&ids, Some("cursor-20"), true));

            // Drain until the prefetch fires
            while feed.take_request().is_none() {
                feed.advance();
            }

            assert!(feed.is_fetch_in_flight());
            assert_eq!(feed.continuation(), Some(&PageToken("cursor-20".to_string())));
        }

        #[test]
        fn test_custom_page_size() {
            let mut feed = PhotoFeed::with_seed(1).with_page_size(25);
            feed.request_page();
            assert_eq!(feed.take_request().unwrap().page_size, 25);
        }
    }

    mod receive_tests {
        use super::*;

        #[test]
        fn test_receive_appends_and_clears_guard() {
            let feed = loaded_feed(page(&["a", "b", "c"], Some("t1"), false));

            assert_eq!(feed.len(), 3);
            assert!(!feed.is_fetch_in_flight());
            assert!(!feed.has_more());
            assert_eq!(feed.continuation(), Some(&PageToken("t1".to_string())));
        }

        #[test]
        fn test_receive_filters_previously_seen_ids() {
            let ids = numbered("p", 12);
            let mut feed = loaded_feed(page_of(&ids, Some("t1"), true));
            feed.advance();
            feed.advance();
            feed.take_request().unwrap();

            // Overlaps with the first batch, including already consumed items
            feed.receive_page(Ok(page(&["p0", "p1", "p11", "new1", "new2"], Some("t2"), false)));

            assert_eq!(feed.len(), 14);
            let mut unique: Vec<&str> = feed.items().iter().map(|i| i.id.as_str()).collect();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), feed.len());
        }

        #[test]
        fn test_receive_filters_duplicates_within_page() {
            let feed = loaded_feed(page(&["a", "a", "b", "b", "c"], None, false));
            assert_eq!(feed.len(), 3);
        }

        #[test]
        fn test_all_duplicate_page_still_updates_pagination() {
            let mut feed = loaded_feed(page(&["a", "b"], Some("t1"), true));
            // Two items are well under the lookahead, so a prefetch is already pending
            let request = feed.take_request().unwrap();
            assert_eq!(request.after, Some(PageToken("t1".to_string())));

            feed.receive_page(Ok(page(&["a", "b"], Some("t2"), false)));

            assert_eq!(feed.len(), 2);
            assert_eq!(feed.continuation(), Some(&PageToken("t2".to_string())));
            assert!(!feed.has_more());
            assert!(feed.take_request().is_none());
        }

        #[test]
        fn test_all_duplicate_page_rearms_exactly_once() {
            let mut feed = loaded_feed(page(&["a", "b"], Some("t1"), true));
            feed.take_request().unwrap();

            feed.receive_page(Ok(page(&["a", "b"], Some("t2"), true)));

            // One follow-up is scheduled, and nothing more until it resolves
            assert!(feed.is_fetch_in_flight());
            assert!(feed.take_request().is_some());
            assert!(!feed.request_page());
            assert!(feed.take_request().is_none());
        }

        #[test]
        fn test_shuffle_is_deterministic_per_seed() {
            let ids = numbered("p", 30);

            let order = |seed: u64| {
                let mut feed = PhotoFeed::with_seed(seed);
                feed.request_page();
                feed.receive_page(Ok(page_of(&ids, None, false)));
                feed.items().iter().map(|i| i.id.clone()).collect::<Vec<_>>()
            };

            assert_eq!(order(42), order(42));
            assert_ne!(order(42), order(43));

            let mut sorted = order(42);
            sorted.sort();
            let mut expected = ids.clone();
            expected.sort();
            assert_eq!(sorted, expected);
        }

        #[test]
        fn test_fetch_failure_clears_guard_without_retry() {
            let mut feed = PhotoFeed::with_seed(1);
            feed.request_page();
            feed.take_request().unwrap();

            feed.receive_page(Err(PhotoBurnError::FetchFailed("offline".to_string())));

            assert!(!feed.is_fetch_in_flight());
            assert!(feed.take_request().is_none());
            assert_eq!(feed.status(), FeedStatus::Failed);
            assert_eq!(feed.last_error(), Some("Failed to fetch media page: offline"));

            // An explicit call retries
            assert!(feed.request_page());
            assert!(feed.last_error().is_none());
            assert_eq!(feed.status(), FeedStatus::Loading);
        }

        #[test]
        fn test_fetch_failure_retries_on_next_advance() {
            let ids = numbered("p", 12);
            let mut feed = loaded_feed(page_of(&ids, Some("t1"), true));
            feed.advance();
            feed.advance();
            feed.take_request().unwrap();

            feed.receive_page(Err(PhotoBurnError::FetchFailed("timeout".to_string())));
            assert!(feed.take_request().is_none());

            feed.advance();
            assert!(feed.take_request().is_some());
        }
    }

    mod permission_tests {
        use super::*;

        #[test]
        fn test_permission_denied_leaves_feed_empty() {
            let mut feed = PhotoFeed::with_seed(1);
            feed.request_page();
            feed.take_request().unwrap();

            feed.receive_page(Err(PhotoBurnError::PermissionDenied));

            assert!(feed.is_empty());
            assert!(feed.is_permission_denied());
            assert_eq!(feed.status(), FeedStatus::PermissionDenied);
            assert!(!feed.needs_prefetch());
        }

        #[test]
        fn test_permission_denied_suspends_prefetch() {
            let mut feed = PhotoFeed::with_seed(1);
            feed.request_page();
            feed.take_request().unwrap();
            feed.receive_page(Err(PhotoBurnError::PermissionDenied));

            assert_eq!(feed.advance(), Advance::Waiting);
            assert!(feed.take_request().is_none());
        }

        #[test]
        fn test_explicit_request_after_denial_retries_from_start() {
            let mut feed = PhotoFeed::with_seed(1);
            feed.request_page();
            feed.take_request().unwrap();
            feed.receive_page(Err(PhotoBurnError::PermissionDenied));

            assert!(feed.request_page());
            assert!(!feed.is_permission_denied());
            assert!(feed.take_request().unwrap().is_first());
        }
    }

    mod advance_tests {
        use super::*;

        #[test]
        fn test_peek_current_and_next() {
            let feed = loaded_feed(page(&["a", "b"], None, false));

            let current = feed.peek_current().unwrap().id.clone();
            let next = feed.peek_next().unwrap().id.clone();
            assert_ne!(current, next);
            assert_eq!(feed.items()[0].id, current);
            assert_eq!(feed.items()[1].id, next);
        }

        #[test]
        fn test_peek_next_none_on_last_item() {
            let mut feed = loaded_feed(page(&["a", "b"], None, false));
            feed.advance();

            assert!(feed.peek_current().is_some());
            assert!(feed.peek_next().is_none());
        }

        #[test]
        fn test_advance_returns_new_current() {
            let mut feed = loaded_feed(page(&["a", "b"], None, false));
            let second = feed.items()[1].clone();

            assert_eq!(feed.advance(), Advance::Item(second));
            assert_eq!(feed.cursor(), 1);
        }

        #[test]
        fn test_advance_reports_end_of_feed() {
            let mut feed = loaded_feed(page(&["a"], None, false));

            assert_eq!(feed.advance(), Advance::EndOfFeed);
            assert_eq!(feed.cursor(), 1);
            assert!(feed.is_exhausted());
            assert_eq!(feed.status(), FeedStatus::Finished);

            // The cursor never passes the end of the queue
            assert_eq!(feed.advance(), Advance::EndOfFeed);
            assert_eq!(feed.cursor(), 1);
        }

        #[test]
        fn test_advance_reports_waiting_when_more_pages_exist() {
            let mut feed = loaded_feed(page(&["a"], Some("t1"), true));
            assert_eq!(feed.advance(), Advance::Waiting);
            assert_eq!(feed.status(), FeedStatus::Loading);
        }

        #[test]
        fn test_empty_library_reports_empty_indefinitely() {
            let mut feed = loaded_feed(page(&[], None, false));

            for _ in 0..3 {
                assert_eq!(feed.advance(), Advance::EndOfFeed);
                assert!(feed.is_exhausted());
                assert_eq!(feed.status(), FeedStatus::Empty);
                assert!(feed.take_request().is_none());
            }
        }
    }

    mod prefetch_tests {
        use super::*;

        #[test]
        fn test_large_first_page_does_not_prefetch() {
            let ids = numbered("p", 12);
            let mut feed = loaded_feed(page_of(&ids, Some("t1"), true));

            assert!(feed.take_request().is_none());
            assert_eq!(feed.lookahead(), 11);
        }

        #[test]
        fn test_prefetch_fires_once_after_two_advances() {
            let ids = numbered("p", 12);
            let mut feed = loaded_feed(page_of(&ids, Some("t1"), true));

            feed.advance();
            assert!(feed.take_request().is_none());

            feed.advance();
            assert_eq!(feed.remaining(), 10);
            let request = feed.take_request().expect("prefetch should fire");
            assert_eq!(request.after, Some(PageToken("t1".to_string())));

            // Further advances while the fetch is pending stay silent
            feed.advance();
            feed.advance();
            assert!(feed.take_request().is_none());
        }

        #[test]
        fn test_prefetch_reevaluated_after_page_load() {
            let ids = numbered("p", 12);
            let mut feed = loaded_feed(page_of(&ids, Some("t1"), true));
            for _ in 0..5 {
                feed.advance();
            }
            feed.take_request().unwrap();

            // A tiny page keeps the lookahead low, so the next fetch is scheduled immediately
            feed.receive_page(Ok(page(&["q0"], Some("t2"), true)));
            assert_eq!(
                feed.take_request().unwrap().after,
                Some(PageToken("t2".to_string()))
            );
        }

        #[test]
        fn test_no_prefetch_when_drained() {
            let mut feed = loaded_feed(page(&["a", "b", "c"], None, false));
            feed.advance();
            feed.advance();
            assert!(feed.take_request().is_none());
        }

        #[test]
        fn test_custom_lookahead_threshold() {
            let mut feed = PhotoFeed::with_seed(1).with_lookahead_threshold(2);
            feed.request_page();
            feed.receive_page(Ok(page(&["a", "b", "c", "d"], Some("t"), true)));

            feed.advance();
            assert!(feed.take_request().is_none());
            feed.advance();
            assert!(feed.take_request().is_some());
        }
    }

    mod invariant_tests {
        use super::*;

        #[test]
        fn test_random_operation_sequences_keep_invariants() {
            let mut driver = StdRng::seed_from_u64(2024);

            for round in 0..50 {
                let mut feed = PhotoFeed::with_seed(round);
                let mut last_cursor = 0;
                let mut token = 0usize;

                for _ in 0..200 {
                    match driver.gen_range(0..4) {
                        0 => {
                            feed.request_page();
                        }
                        1 => {
                            if feed.take_request().is_some() || feed.is_fetch_in_flight() {
                                // Ids drawn from a small space so batches overlap heavily
                                let count = driver.gen_range(0..15);
                                let ids: Vec<String> = (0..count)
                                    .map(|_| format!("id{}", driver.gen_range(0..60)))
                                    .collect();
                                token += 1;
                                let has_more = driver.gen_bool(0.8);
                                feed.receive_page(Ok(page_of(
                                    &ids,
                                    Some(token.to_string().as_str()),
                                    has_more,
                                )));
                            }
                        }
                        2 => {
                            if feed.is_fetch_in_flight() {
                                feed.receive_page(Err(PhotoBurnError::FetchFailed(
                                    "flaky".to_string(),
                                )));
                            }
                        }
                        _ => {
                            feed.advance();
                        }
                    }

                    assert!(feed.cursor() >= last_cursor);
                    assert!(feed.cursor() <= feed.len());
                    last_cursor = feed.cursor();

                    let ids: HashSet<&str> = feed.items().iter().map(|i| i.id.as_str()).collect();
                    assert_eq!(ids.len(), feed.len());
                }
            }
        }
    }
}
