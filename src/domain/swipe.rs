//! Swipe action state machine.
//!
//! Every input, whether a drag gesture, a button trigger, an animation frame
//! or an animation completion, goes through [`SwipeMachine::handle`]. A
//! settle is identified by a [`SettleTicket`]; only the completion carrying
//! the live ticket can commit, so a duplicated or late callback is ignored and
//! each item is committed at most once.

use super::feed::PhotoFeed;
use super::settle::SettleAnimation;
use super::{MediaItem, Offset, SwipeDirection};
use tracing::{debug, info};

/// Share of the viewport width a drag must exceed to commit
pub const THRESHOLD_FRACTION: f32 = 0.25;

/// Off-screen target, in viewport widths
pub const EXIT_DISTANCE_FACTOR: f32 = 1.5;

pub const MAX_ROTATION_DEGREES: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Return to rest without committing.
    Cancel,
    Commit(SwipeDirection),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipePhase {
    Idle,
    Dragging,
    Settling {
        outcome: SettleOutcome,
        ticket: SettleTicket,
        animation: SettleAnimation,
    },
    Committing(SwipeDirection),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeEvent {
    GestureStart,
    /// Cumulative translation since the gesture started.
    GestureUpdate { translation_x: f32, translation_y: f32 },
    GestureEnd,
    Trigger(SwipeDirection),
    /// Intermediate position reported by whoever runs the settle animation.
    SettleFrame(Offset),
    AnimationComplete(SettleTicket),
}

/// What the host has to do after an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Ignored,
    Moved,
    /// Run `animation` and report back with `AnimationComplete(ticket)`.
    Settle {
        ticket: SettleTicket,
        animation: SettleAnimation,
    },
    Cancelled,
    Committed(SwipeDirection),
}

/// Side effects of a commit
pub trait SwipeHost {
    /// Called for a burned item before the feed cursor moves past it.
    fn discard(&mut self, item: &MediaItem);

    /// Called once per commit, after the feed cursor has advanced.
    fn swiped(&mut self, direction: SwipeDirection);
}

#[derive(Debug)]
pub struct SwipeMachine {
    offset: Offset,
    phase: SwipePhase,
    viewport_width: f32,
    next_ticket: u64,
}

impl SwipeMachine {
    pub fn new(viewport_width: f32) -> Self {
        Self {
            offset: Offset::ZERO,
            phase: SwipePhase::Idle,
            viewport_width,
            next_ticket: 0,
        }
    }

    pub fn set_viewport_width(&mut self, viewport_width: f32) {
        self.viewport_width = viewport_width;
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn threshold(&self) -> f32 {
        self.viewport_width * THRESHOLD_FRACTION
    }

    pub fn exit_distance(&self) -> f32 {
        self.viewport_width * EXIT_DISTANCE_FACTOR
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn phase(&self) -> SwipePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, SwipePhase::Idle)
    }

    /// Card tilt, interpolated over half a viewport either side and clamped
    pub fn rotation_degrees(&self) -> f32 {
        let half = self.viewport_width / 2.0;
        if half <= 0.0 {
            return 0.0;
        }
        (self.offset.x / half).clamp(-1.0, 1.0) * MAX_ROTATION_DEGREES
    }

    /// Outcome a release at the current offset would produce.
    ///
    /// A drag sitting exactly on the threshold cancels.
    pub fn decide(&self) -> SettleOutcome {
        let threshold = self.threshold();
        if self.offset.x < -threshold {
            SettleOutcome::Commit(SwipeDirection::Discard)
        } else if self.offset.x > threshold {
            SettleOutcome::Commit(SwipeDirection::Keep)
        } else {
            SettleOutcome::Cancel
        }
    }

    pub fn trigger_discard(&mut self, feed: &mut PhotoFeed, host: &mut dyn SwipeHost) -> Transition {
        self.handle(SwipeEvent::Trigger(SwipeDirection::Discard), feed, host)
    }

    pub fn trigger_keep(&mut self, feed: &mut PhotoFeed, host: &mut dyn SwipeHost) -> Transition {
        self.handle(SwipeEvent::Trigger(SwipeDirection::Keep), feed, host)
    }

    pub fn handle(
        &mut self,
        event: SwipeEvent,
        feed: &mut PhotoFeed,
        host: &mut dyn SwipeHost,
    ) -> Transition {
        match (self.phase, event) {
            (SwipePhase::Idle, SwipeEvent::GestureStart) => {
                if feed.peek_current().is_none() {
                    return Transition::Ignored;
                }
                self.phase = SwipePhase::Dragging;
                Transition::Moved
            }
            (
                SwipePhase::Dragging,
                SwipeEvent::GestureUpdate {
                    translation_x,
                    translation_y,
                },
            ) => {
                self.offset = Offset::new(translation_x, translation_y);
                Transition::Moved
            }
            (SwipePhase::Dragging, SwipeEvent::GestureEnd) => {
                let outcome = self.decide();
                let target = match outcome {
                    SettleOutcome::Cancel => Offset::ZERO,
                    SettleOutcome::Commit(direction) => {
                        Offset::new(direction.sign() * self.exit_distance(), self.offset.y)
                    }
                };
                self.begin_settle(outcome, target)
            }
            (SwipePhase::Idle, SwipeEvent::Trigger(direction)) => {
                if feed.peek_current().is_none() {
                    return Transition::Ignored;
                }
                let target = Offset::new(direction.sign() * self.exit_distance(), 0.0);
                self.begin_settle(SettleOutcome::Commit(direction), target)
            }
            (SwipePhase::Settling { .. }, SwipeEvent::SettleFrame(offset)) => {
                self.offset = offset;
                Transition::Moved
            }
            (SwipePhase::Settling { outcome, ticket, .. }, SwipeEvent::AnimationComplete(done))
                if done == ticket =>
            {
                self.finish(outcome, feed, host)
            }
            (phase, event) => {
                debug!(?phase, ?event, "Ignoring swipe event");
                Transition::Ignored
            }
        }
    }

    fn begin_settle(&mut self, outcome: SettleOutcome, target: Offset) -> Transition {
        let ticket = SettleTicket(self.next_ticket);
        self.next_ticket += 1;

        let animation = SettleAnimation::new(self.offset, target);
        self.phase = SwipePhase::Settling {
            outcome,
            ticket,
            animation,
        };
        debug!(?outcome, ?ticket, "Settling card");
        Transition::Settle { ticket, animation }
    }

    fn finish(
        &mut self,
        outcome: SettleOutcome,
        feed: &mut PhotoFeed,
        host: &mut dyn SwipeHost,
    ) -> Transition {
        let direction = match outcome {
            SettleOutcome::Cancel => {
                self.reset();
                return Transition::Cancelled;
            }
            SettleOutcome::Commit(direction) => direction,
        };

        self.phase = SwipePhase::Committing(direction);

        match feed.peek_current() {
            Some(item) => {
                info!(id = %item.id, ?direction, "Committing swipe");
                if direction == SwipeDirection::Discard {
                    host.discard(item);
                }
            }
            None => {
                self.reset();
                return Transition::Cancelled;
            }
        }

        feed.advance();
        self.reset();
        host.swiped(direction);
        Transition::Committed(direction)
    }

    fn reset(&mut self) {
        self.offset = Offset::ZERO;
        self.phase = SwipePhase::Idle;
    }
}
