pub mod feed;
pub mod settle;
pub mod swipe;

pub use feed::{
    Advance, FeedStatus, MediaPage, PageRequest, PageToken, PhotoFeed, DEFAULT_PAGE_SIZE,
    LOOKAHEAD_THRESHOLD,
};
pub use settle::{SettleAnimation, SETTLE_DURATION};
pub use swipe::{
    SettleOutcome, SettleTicket, SwipeEvent, SwipeHost, SwipeMachine, SwipePhase, Transition,
};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classifies a file extension, returning `None` for anything that is not media.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "heic" | "heif" | "tif"
            | "tiff" | "avif" | "dng" | "raw" | "cr2" | "nef" | "arw" => Some(MediaKind::Photo),

            "mp4" | "mov" | "m4v" | "avi" | "mkv" | "webm" | "3gp" | "mts" | "wmv" => {
                Some(MediaKind::Video)
            }

            _ => None,
        }
    }
}

/// A photo or video served by a media source. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: String,
    pub uri: String,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
}

/// The outcome of a committed swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Burn: the item goes to the trash.
    Discard,
    Keep,
}

impl SwipeDirection {
    /// Sign of the horizontal axis the card leaves through.
    pub fn sign(self) -> f32 {
        match self {
            SwipeDirection::Discard => -1.0,
            SwipeDirection::Keep => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Statistics about decisions made during the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatistics {
    pub kept: usize,
    pub burned: usize,
    /// Discards whose trash operation failed after the card had already left.
    pub failed_deletes: usize,
}

impl SessionStatistics {
    pub fn record(&mut self, direction: SwipeDirection) {
        match direction {
            SwipeDirection::Discard => self.burned += 1,
            SwipeDirection::Keep => self.kept += 1,
        }
    }

    pub fn reviewed(&self) -> usize {
        self.kept + self.burned
    }
}
