//! Async runtime for the sync engine
//!
//! Hosts a `SyncDriver` on a tokio task so playback code, gesture handlers
//! and lyric loaders can feed it from anywhere:
//! - `handle`: Cloneable command sender
//! - `state`: Lock-protected snapshot readable without awaiting
//! - `task`: The task loop and its timers

mod handle;
mod state;
mod task;

pub use handle::SyncHandle;
pub use state::{SharedSyncState, SyncSnapshot};
pub use task::{SyncTaskHandle, spawn_sync_task};
