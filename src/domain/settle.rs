//! Settle tween used while a card travels to rest or off-screen.

use super::Offset;
use std::time::Duration;

pub const SETTLE_DURATION: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleAnimation {
    pub from: Offset,
    pub to: Offset,
    pub duration: Duration,
}

impl SettleAnimation {
    pub fn new(from: Offset, to: Offset) -> Self {
        Self {
            from,
            to,
            duration: SETTLE_DURATION,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Position after `elapsed`, eased out and pinned to `to` once finished
    pub fn sample(&self, elapsed: Duration) -> Offset {
        let t = self.progress(elapsed);
        let eased = ease_out_cubic(t);
        Offset {
            x: self.from.x + (self.to.x - self.from.x) * eased,
            y: self.from.y + (self.to.y - self.from.y) * eased,
        }
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    fn progress(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}
