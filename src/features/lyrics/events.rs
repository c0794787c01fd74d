//! Sync communication types
//!
//! - `SyncCommand` - Inputs sent from the UI/playback side to the sync task
//! - `SyncEvent` - Outputs the presentation layer reacts to
//!
//! ## Architecture
//! ```text
//! UI / player (SyncHandle) --[SyncCommand]--> Sync task (SyncDriver)
//! UI                       <--[SyncEvent]---- Sync task
//! ```

use serde::{Deserialize, Serialize};

use super::follow::FollowMode;
use super::source::LoadError;
use super::types::{LinePosition, RawLyrics};

/// A point within the view in unit coordinates (`0.0..=1.0` on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub x: f32,
    pub y: f32,
}

impl AnchorPoint {
    pub const TOP: Self = Self::new(0.5, 0.0);
    pub const CENTER: Self = Self::new(0.5, 0.5);
    pub const LEADING: Self = Self::new(0.0, 0.5);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The point reflected through the view center
    pub fn mirrored(self) -> Self {
        Self::new(1.0 - self.x, 1.0 - self.y)
    }

    /// Font anchor adjusted for a line's side: secondary lines mirror it
    pub fn for_position(self, position: LinePosition) -> Self {
        if self == Self::CENTER {
            return self;
        }
        match position {
            LinePosition::Primary => self,
            LinePosition::Secondary => self.mirrored(),
        }
    }
}

impl Default for AnchorPoint {
    fn default() -> Self {
        Self::new(0.5, 0.08)
    }
}

/// Where a scrolled-to entry is aligned
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAnchor {
    /// The timeline's top anchor, used for the first entry
    Top,
    /// The configured highlight anchor
    Highlight(AnchorPoint),
}

impl ScrollAnchor {
    pub fn point(self) -> AnchorPoint {
        match self {
            ScrollAnchor::Top => AnchorPoint::TOP,
            ScrollAnchor::Highlight(point) => point,
        }
    }
}

// ============ Events (Sync task -> UI) ============

/// Events emitted by the sync driver
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Scroll so that `target` sits at `anchor`
    ScrollTo {
        target: usize,
        anchor: ScrollAnchor,
        /// Index the target was derived from
        ///
        /// Entry 0 when a resume happens before any entry became active;
        /// `SyncDriver::active_index` stays `None` in that case.
        active: usize,
    },
    /// Highlighted entry changed (spacer entries are reported as `None`)
    ActiveChanged {
        previous: Option<usize>,
        current: Option<usize>,
    },
    /// Follow mode switched between following and user override
    FollowModeChanged { mode: FollowMode },
    /// The user picked an entry; playback should seek to `time`
    SeekRequested { index: usize, time: f64 },
    /// Transient "selected" flag for a tapped entry
    SelectionPulse { index: usize, selected: bool },
    /// A new timeline was installed and all derived state reset
    TimelineReplaced { len: usize, generation: u64 },
}

// ============ Commands (UI -> Sync task) ============

/// Commands sent to the sync task
///
/// Processed one at a time, in arrival order.
#[derive(Debug)]
pub enum SyncCommand {
    /// New playback position in seconds
    UpdateTime { time: f64 },
    /// User started dragging/scrolling the lyrics
    GestureStart,
    /// User released the lyrics
    GestureEnd,
    /// User tapped an entry
    TapSelect { index: usize },
    /// Loader finished (or failed) for `request_id`
    Loaded {
        request_id: u64,
        result: Result<RawLyrics, LoadError>,
    },
    /// Stop the sync task
    Shutdown,
}

// ============ Channel Types ============

/// Sender for sync commands (held by SyncHandle)
pub type SyncCommandSender = tokio::sync::mpsc::UnboundedSender<SyncCommand>;

/// Receiver for sync commands (held by the sync task)
pub type SyncCommandReceiver = tokio::sync::mpsc::UnboundedReceiver<SyncCommand>;

/// Sender for sync events (held by the sync task)
pub type SyncEventSender = tokio::sync::mpsc::UnboundedSender<SyncEvent>;

/// Receiver for sync events (held by the UI adapter)
pub type SyncEventReceiver = tokio::sync::mpsc::UnboundedReceiver<SyncEvent>;

/// Create a new sync command channel
pub fn sync_command_channel() -> (SyncCommandSender, SyncCommandReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Create a new sync event channel
pub fn sync_event_channel() -> (SyncEventSender, SyncEventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
