//! Sync handle for non-blocking control from UI and playback code
//!
//! `SyncHandle` sends commands to the sync task and returns immediately.
//! Results arrive as `SyncEvent`s; current state is read from
//! `SharedSyncState` without blocking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::state::SharedSyncState;
use crate::features::lyrics::events::{SyncCommand, SyncCommandSender};
use crate::features::lyrics::{LyricSource, RawLyrics, SourceDescriptor};

/// Handle for driving the sync task
///
/// Cheap to clone; all clones feed the same task.
#[derive(Clone)]
pub struct SyncHandle {
    command_tx: SyncCommandSender,
    state: SharedSyncState,
    /// Id of the newest load request; older results are discarded by the task
    latest_request: Arc<AtomicU64>,
}

impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandle")
            .field("state", &self.state)
            .field("latest_request", &self.latest_request.load(Ordering::Relaxed))
            .finish()
    }
}

impl SyncHandle {
    pub(crate) fn new(
        command_tx: SyncCommandSender,
        state: SharedSyncState,
        latest_request: Arc<AtomicU64>,
    ) -> Self {
        Self {
            command_tx,
            state,
            latest_request,
        }
    }

    /// Shared state written by the sync task
    pub fn state(&self) -> &SharedSyncState {
        &self.state
    }

    // ============ Playback ============

    /// Report the current playback position in seconds
    pub fn update_time(&self, time: f64) {
        let _ = self.command_tx.send(SyncCommand::UpdateTime { time });
    }

    // ============ Gestures ============

    /// User started scrolling the lyrics
    pub fn gesture_start(&self) {
        let _ = self.command_tx.send(SyncCommand::GestureStart);
    }

    /// User released the lyrics
    pub fn gesture_end(&self) {
        let _ = self.command_tx.send(SyncCommand::GestureEnd);
    }

    /// User tapped entry `index`
    ///
    /// Listen for `SyncEvent::SeekRequested` to forward the seek to the player.
    pub fn tap_select(&self, index: usize) {
        let _ = self.command_tx.send(SyncCommand::TapSelect { index });
    }

    // ============ Loading ============

    /// Install already-loaded lyrics
    ///
    /// Supersedes any load still in flight. Returns the request id.
    pub fn install(&self, raw: RawLyrics) -> u64 {
        let request_id = self.next_request_id();
        let _ = self.command_tx.send(SyncCommand::Loaded {
            request_id,
            result: Ok(raw),
        });
        request_id
    }

    /// Load lyrics in the background and install them when ready
    ///
    /// Must be called from within a tokio runtime. If another load or
    /// install is requested before this one finishes, its result is dropped.
    /// Returns the request id.
    pub fn load_from<S: LyricSource>(&self, source: Arc<S>, descriptor: SourceDescriptor) -> u64 {
        let request_id = self.next_request_id();
        let command_tx = self.command_tx.clone();

        tracing::debug!("Loading lyrics from {} (request {})", descriptor, request_id);
        tokio::spawn(async move {
            let result = source.load(&descriptor).await;
            let _ = command_tx.send(SyncCommand::Loaded { request_id, result });
        });
        request_id
    }

    /// Stop the sync task
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(SyncCommand::Shutdown);
    }

    fn next_request_id(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    }
}
