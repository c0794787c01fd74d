//! Lyric synchronization and scroll-follow engine
//!
//! Maps a playback clock onto an indexed lyric timeline, decides which entry
//! is active, and tells the view where to scroll. User scroll gestures pause
//! automatic following until a short quiet period has passed.
//!
//! `SyncDriver` is the synchronous core and takes the current instant as an
//! argument, which keeps it deterministic. `spawn_sync_task` runs it on tokio
//! and drives its timers.

pub mod features;
pub mod runtime;

pub use features::lyrics::{
    FollowMode, LoadError, LyricSource, RawLyrics, SyncDriver, SyncEvent, Timeline,
};
pub use features::{SettingsError, SyncSettings};
pub use runtime::{SharedSyncState, SyncHandle, SyncTaskHandle, spawn_sync_task};
