//! Lyrics module - timeline model and playback synchronization
//!
//! - `types` / `timeline`: Indexed lyric entries (line-level or word-timed)
//! - `resolver`: Playback time -> active entry
//! - `follow`: Auto-follow vs. user scroll override
//! - `driver`: Orchestrates the above and emits `SyncEvent`s
//! - `source`: Interface of the external lyric loader

pub mod driver;
pub mod events;
pub mod follow;
pub mod resolver;
pub mod source;
pub mod timeline;
pub mod types;

// Re-export commonly used items
pub use driver::{SyncDriver, SyncError, SyncState};
pub use events::{AnchorPoint, ScrollAnchor, SyncCommand, SyncEvent};
pub use follow::{FollowController, FollowMode};
pub use resolver::{active_word, resolve};
pub use source::{
    LoadError, LyricSource, LyricsFormat, SourceDescriptor, SourceLocation, TextEncoding,
};
pub use timeline::{Timeline, TimelineError};
pub use types::*;
