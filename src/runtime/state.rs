//! Thread-safe snapshot of the sync task's state
//!
//! The sync task writes after every command; UI code reads without waiting
//! on the task.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::features::lyrics::{FollowMode, SyncDriver};

/// Point-in-time copy of the driver state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SyncSnapshot {
    pub active_index: Option<usize>,
    /// Active index unless it points at a spacer
    pub highlighted: Option<usize>,
    pub follow_mode: FollowMode,
    pub last_playback_time: f64,
    pub generation: u64,
    /// Number of entries in the installed timeline
    pub entries: usize,
}

#[derive(Clone, Default)]
pub struct SharedSyncState {
    inner: Arc<RwLock<SyncSnapshot>>,
}

impl std::fmt::Debug for SharedSyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SharedSyncState")
            .field("active_index", &inner.active_index)
            .field("follow_mode", &inner.follow_mode)
            .field("generation", &inner.generation)
            .finish()
    }
}

impl SharedSyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        *self.inner.read()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.inner.read().active_index
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.inner.read().highlighted
    }

    pub fn follow_mode(&self) -> FollowMode {
        self.inner.read().follow_mode
    }

    pub fn is_following(&self) -> bool {
        self.follow_mode() == FollowMode::Following
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    // ---- Update methods (called by the sync task) ----

    pub(crate) fn update_from(&self, driver: &SyncDriver) {
        let mut inner = self.inner.write();
        inner.active_index = driver.active_index();
        inner.highlighted = driver.highlighted();
        inner.follow_mode = driver.follow_mode();
        inner.last_playback_time = driver.last_playback_time();
        inner.generation = driver.generation();
        inner.entries = driver.timeline().len();
    }
}
