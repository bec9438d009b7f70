//! A swiping session: the feed, the swipe machine and their side effects,
//! driven by a host loop through `pump` and `tick`.

use crate::async_feed::{FeedLoader, PumpReport};
use crate::domain::{
    FeedStatus, MediaItem, MediaKind, Offset, PhotoFeed, SessionStatistics, SettleAnimation,
    SettleTicket, SwipeDirection, SwipeEvent, SwipeHost, SwipeMachine, Transition,
};
use crate::error::Result;
use crate::media_source::MediaSource;
use crate::store::BurnCounter;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Side effects of a committed swipe
struct Effects {
    loader: FeedLoader,
    counter: BurnCounter,
    stats: SessionStatistics,
}

impl SwipeHost for Effects {
    fn discard(&mut self, item: &MediaItem) {
        self.loader.delete(item);
    }

    fn swiped(&mut self, direction: SwipeDirection) {
        self.stats.record(direction);
        if direction == SwipeDirection::Discard {
            let total = self.counter.increment();
            info!(total, "Burned item");
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveSettle {
    animation: SettleAnimation,
    ticket: SettleTicket,
    started: Instant,
}

pub struct Session {
    feed: PhotoFeed,
    swipe: SwipeMachine,
    effects: Effects,
    settle: Option<ActiveSettle>,
}

impl Session {
    pub fn new(
        source: Arc<dyn MediaSource>,
        kinds: Vec<MediaKind>,
        feed: PhotoFeed,
        counter: BurnCounter,
        viewport_width: f32,
    ) -> Result<Self> {
        Ok(Self {
            feed,
            swipe: SwipeMachine::new(viewport_width),
            effects: Effects {
                loader: FeedLoader::new(source, kinds)?,
                counter,
                stats: SessionStatistics::default(),
            },
            settle: None,
        })
    }

    /// Requests the first page
    pub fn start(&mut self) {
        self.feed.request_page();
        self.effects.loader.dispatch(&mut self.feed);
    }

    /// Applies finished background work without blocking
    pub fn pump(&mut self) -> PumpReport {
        let report = self.effects.loader.pump(&mut self.feed);
        self.effects.stats.failed_deletes += report.failed_deletes.len();
        report
    }

    /// Blocks until every fetch and trash operation has finished
    pub fn wait_idle(&mut self) -> PumpReport {
        let report = self.effects.loader.wait_idle(&mut self.feed);
        self.effects.stats.failed_deletes += report.failed_deletes.len();
        report
    }

    /// Ends the session, waiting for outstanding fetches and trash
    /// operations so the returned statistics are final.
    pub fn finish(mut self) -> SessionStatistics {
        let report = self.wait_idle();
        if !report.failed_deletes.is_empty() {
            info!(
                failed = report.failed_deletes.len(),
                "Trash operations failed during shutdown"
            );
        }
        self.effects.stats
    }

    /// Advances the running settle animation to `now`, completing it once its
    /// duration has elapsed.
    pub fn tick(&mut self, now: Instant) -> Transition {
        let active = match self.settle {
            Some(active) => active,
            None => return Transition::Ignored,
        };

        let elapsed = now.saturating_duration_since(active.started);
        self.apply(
            SwipeEvent::SettleFrame(active.animation.sample(elapsed)),
            now,
        );

        if !active.animation.is_finished(elapsed) {
            return Transition::Moved;
        }

        self.settle = None;
        self.apply(SwipeEvent::AnimationComplete(active.ticket), now)
    }

    pub fn trigger_discard(&mut self, now: Instant) -> Transition {
        self.apply(SwipeEvent::Trigger(SwipeDirection::Discard), now)
    }

    pub fn trigger_keep(&mut self, now: Instant) -> Transition {
        self.apply(SwipeEvent::Trigger(SwipeDirection::Keep), now)
    }

    pub fn gesture_start(&mut self, now: Instant) -> Transition {
        self.apply(SwipeEvent::GestureStart, now)
    }

    pub fn gesture_update(&mut self, translation_x: f32, translation_y: f32, now: Instant) -> Transition {
        self.apply(
            SwipeEvent::GestureUpdate {
                translation_x,
                translation_y,
            },
            now,
        )
    }

    pub fn gesture_end(&mut self, now: Instant) -> Transition {
        self.apply(SwipeEvent::GestureEnd, now)
    }

    /// Asks for media access again after a denial, or retries a failed fetch
    pub fn retry_permission(&mut self) -> bool {
        match self.feed.status() {
            FeedStatus::PermissionDenied | FeedStatus::Failed => {
                let scheduled = self.feed.request_page();
                self.effects.loader.dispatch(&mut self.feed);
                scheduled
            }
            _ => false,
        }
    }

    pub fn set_viewport_width(&mut self, viewport_width: f32) {
        self.swipe.set_viewport_width(viewport_width);
    }

    fn apply(&mut self, event: SwipeEvent, now: Instant) -> Transition {
        let transition = self.swipe.handle(event, &mut self.feed, &mut self.effects);

        match transition {
            Transition::Settle { ticket, animation } => {
                self.settle = Some(ActiveSettle {
                    animation,
                    ticket,
                    started: now,
                });
            }
            Transition::Committed(_) => {
                // Advancing may have scheduled a prefetch
                self.effects.loader.dispatch(&mut self.feed);
            }
            _ => {}
        }

        transition
    }

    pub fn feed(&self) -> &PhotoFeed {
        &self.feed
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.feed.peek_current()
    }

    pub fn next(&self) -> Option<&MediaItem> {
        self.feed.peek_next()
    }

    pub fn status(&self) -> FeedStatus {
        self.feed.status()
    }

    pub fn swipe(&self) -> &SwipeMachine {
        &self.swipe
    }

    pub fn offset(&self) -> Offset {
        self.swipe.offset()
    }

    pub fn is_animating(&self) -> bool {
        self.settle.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.effects.loader.is_busy()
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.effects.stats
    }

    pub fn burn_count(&self) -> u64 {
        self.effects.counter.count()
    }
}
