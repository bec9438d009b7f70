//! Photoburn - swipe through a photo library and burn what you don't need
//!
//! This crate provides the feed cursor, the swipe state machine and the media
//! source adapters behind the `photoburn` terminal app, so the same flow can
//! be driven programmatically.

pub mod async_feed;
pub mod cli;
pub mod domain;
pub mod error;
pub mod library;
pub mod logging;
pub mod media_source;
pub mod session;
pub mod store;
pub mod tui;

// Re-export primary types for convenience
pub use domain::{
    Advance, FeedStatus, MediaItem, MediaKind, MediaPage, Offset, PageRequest, PageToken,
    PhotoFeed, SessionStatistics, SwipeDirection, SwipeEvent, SwipeHost, SwipeMachine,
    Transition,
};
pub use error::{PhotoBurnError, Result};
pub use library::LocalLibrary;
pub use media_source::{MediaSource, MemoryLibrary, PermissionStatus};
pub use session::Session;
pub use store::BurnCounter;
