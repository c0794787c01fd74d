//! Sync driver
//!
//! Owns the timeline and all derived state. Every mutation goes through one
//! of the entry points below, each returning the events it produced:
//! - `update_time` - playback position changed
//! - `gesture_start` / `gesture_end` - user scroll override
//! - `tap_select` - user picked an entry (seek request + selection pulse)
//! - `install` / `load` - a new timeline replaces the old one
//! - `poll_timers` - deferred work (resume-follow, pulse expiry) is due
//!
//! The driver never reads a clock. Callers pass `now`, which keeps the
//! state machine deterministic under test.

use std::time::Instant;

use super::events::{ScrollAnchor, SyncEvent};
use super::follow::{FollowController, FollowMode};
use super::resolver;
use super::source::LoadError;
use super::timeline::{Timeline, TimelineError};
use super::types::{RawLyrics, TimelineKind};
use crate::features::settings::SyncSettings;

/// Errors from playback-time input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncError {
    /// Playback time was NaN or infinite
    InvalidTime(f64),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::InvalidTime(time) => write!(f, "Invalid playback time: {}", time),
        }
    }
}

impl std::error::Error for SyncError {}

/// Snapshot of the driver's derived state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncState {
    pub active_index: Option<usize>,
    pub follow_mode: FollowMode,
    pub last_playback_time: f64,
    pub pending_resume_deadline: Option<Instant>,
}

/// Deferred work other than the follow resume
#[derive(Debug, Clone, Copy, PartialEq)]
enum TaskKind {
    /// Clear the selected flag of a tapped entry
    PulseExpiry { index: usize },
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    kind: TaskKind,
    due: Instant,
    /// Timeline generation the task was scheduled under
    generation: u64,
}

pub struct SyncDriver {
    settings: SyncSettings,
    timeline: Timeline,
    follow: FollowController,
    active: Option<usize>,
    last_time: Option<f64>,
    /// Bumped on every timeline install; tasks from older generations never fire
    generation: u64,
    tasks: Vec<ScheduledTask>,
}

impl SyncDriver {
    pub fn new(settings: SyncSettings) -> Self {
        let follow = FollowController::new(settings.resume_delay());
        Self {
            settings,
            timeline: Timeline::empty(),
            follow,
            active: None,
            last_time: None,
            generation: 0,
            tasks: Vec::new(),
        }
    }

    // ============ Queries ============

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Active index if it names an entry that may be highlighted
    pub fn highlighted(&self) -> Option<usize> {
        self.highlight_of(self.active)
    }

    pub fn follow_mode(&self) -> FollowMode {
        self.follow.mode()
    }

    pub fn last_playback_time(&self) -> f64 {
        self.last_time.unwrap_or(0.0)
    }

    pub fn state(&self) -> SyncState {
        SyncState {
            active_index: self.active,
            follow_mode: self.follow.mode(),
            last_playback_time: self.last_playback_time(),
            pending_resume_deadline: self.follow.pending_resume(),
        }
    }

    /// Word being sung in the active word-timed entry at the last known time
    pub fn active_word(&self) -> Option<usize> {
        let line = self.timeline.get(self.active?)?.as_word_timed()?;
        resolver::active_word(&line.main_words, self.last_time?)
    }

    /// Earliest instant at which `poll_timers` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks
            .iter()
            .filter(|task| task.generation == self.generation)
            .map(|task| task.due)
            .chain(self.follow.pending_resume())
            .min()
    }

    // ============ Settings ============

    pub fn set_settings(&mut self, settings: SyncSettings) {
        self.follow.set_resume_delay(settings.resume_delay());
        self.settings = settings;
    }

    // ============ Timeline replacement ============

    /// Build a timeline from loader output and install it
    ///
    /// On error the current timeline and state are kept.
    pub fn load(&mut self, raw: RawLyrics) -> Result<Vec<SyncEvent>, TimelineError> {
        match Timeline::new(raw) {
            Ok(timeline) => Ok(self.install(timeline)),
            Err(e) => {
                tracing::warn!("Rejected lyrics, keeping previous timeline: {}", e);
                Err(e)
            }
        }
    }

    /// Loader failed; the current timeline stays on screen
    pub fn load_failed(&self, error: &LoadError) {
        tracing::warn!(
            "Failed to load lyrics, keeping {} entries: {}",
            self.timeline.len(),
            error
        );
    }

    /// Replace the timeline and reset all derived state
    pub fn install(&mut self, timeline: Timeline) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        let previous_highlight = self.highlighted();
        let was_overridden = !self.follow.is_following();

        self.generation += 1;
        self.timeline = timeline;
        self.active = None;
        self.follow.reset();

        if was_overridden {
            events.push(SyncEvent::FollowModeChanged {
                mode: FollowMode::Following,
            });
        }
        if previous_highlight.is_some() {
            events.push(SyncEvent::ActiveChanged {
                previous: previous_highlight,
                current: None,
            });
        }
        events.push(SyncEvent::TimelineReplaced {
            len: self.timeline.len(),
            generation: self.generation,
        });

        tracing::info!(
            "Installed {} lyric entries ({:?}), generation {}",
            self.timeline.len(),
            self.timeline.kind(),
            self.generation
        );
        events
    }

    // ============ Playback input ============

    /// Apply a playback-time update
    ///
    /// Non-finite times are rejected and leave all state untouched.
    pub fn update_time(&mut self, time: f64) -> Result<Vec<SyncEvent>, SyncError> {
        if !time.is_finite() {
            tracing::warn!("Dropping playback time update: {}", time);
            return Err(SyncError::InvalidTime(time));
        }

        let mut events = Vec::new();
        self.last_time = Some(time);

        let resolved = resolver::resolve_with_threshold(
            &self.timeline,
            time,
            self.active,
            self.settings.zero_time_threshold(),
        );

        if self.set_active(resolved, &mut events) && self.follow.should_scroll() {
            if let Some(scroll) = self.follow_scroll() {
                events.push(scroll);
            }
        }
        Ok(events)
    }

    // ============ Gesture input ============

    /// User began scrolling; automatic scrolling stops immediately
    pub fn gesture_start(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        if self.follow.gesture_start() {
            tracing::debug!("Follow suspended at index {:?}", self.active);
            events.push(SyncEvent::FollowModeChanged {
                mode: FollowMode::Overridden,
            });
        }
        events
    }

    /// User released; follow resumes after the configured delay
    pub fn gesture_end(&mut self, now: Instant) -> Vec<SyncEvent> {
        if let Some(deadline) = self.follow.gesture_end(now) {
            tracing::debug!(
                "Follow resumes in {:?}",
                deadline.saturating_duration_since(now)
            );
        }
        Vec::new()
    }

    /// User tapped an entry: request a seek and pulse the selection
    pub fn tap_select(&mut self, index: usize, now: Instant) -> Vec<SyncEvent> {
        let Some(entry) = self.timeline.get(index) else {
            tracing::debug!("Ignoring tap on missing entry {}", index);
            return Vec::new();
        };
        if entry.is_spacer() {
            return Vec::new();
        }
        let time = entry.activation_time();

        self.tasks
            .retain(|task| task.kind != TaskKind::PulseExpiry { index });
        self.tasks.push(ScheduledTask {
            kind: TaskKind::PulseExpiry { index },
            due: self.pulse_deadline(now),
            generation: self.generation,
        });

        vec![
            SyncEvent::SeekRequested { index, time },
            SyncEvent::SelectionPulse {
                index,
                selected: true,
            },
        ]
    }

    // ============ Deferred work ============

    /// Run every scheduled task due at `now`
    pub fn poll_timers(&mut self, now: Instant) -> Vec<SyncEvent> {
        let mut events = Vec::new();

        if self.follow.poll_resume(now) {
            events.push(SyncEvent::FollowModeChanged {
                mode: FollowMode::Following,
            });
            self.resume(&mut events);
        }

        let generation = self.generation;
        let mut due = Vec::new();
        self.tasks.retain(|task| {
            if task.generation != generation {
                return false;
            }
            if task.due <= now {
                due.push(*task);
                return false;
            }
            true
        });
        due.sort_by_key(|task| task.due);

        for task in due {
            match task.kind {
                TaskKind::PulseExpiry { index } => events.push(SyncEvent::SelectionPulse {
                    index,
                    selected: false,
                }),
            }
        }
        events
    }

    /// Back in follow mode: catch up with playback and scroll to it
    fn resume(&mut self, events: &mut Vec<SyncEvent>) {
        if let Some(time) = self.last_time {
            let resolved = resolver::resolve_with_threshold(
                &self.timeline,
                time,
                self.active,
                self.settings.zero_time_threshold(),
            );
            self.set_active(resolved, events);
        }

        if self.timeline.is_empty() {
            return;
        }
        // Nothing resolved yet (time before the first line): scroll to the top
        let active = self.active.unwrap_or(0);
        let (target, anchor) = match active {
            0 => (0, ScrollAnchor::Top),
            i => (i - 1, ScrollAnchor::Highlight(self.settings.highlight_anchor)),
        };
        tracing::debug!("Follow resumed at index {}, scrolling to {}", active, target);
        events.push(SyncEvent::ScrollTo {
            target,
            anchor,
            active,
        });
    }

    // ============ Helpers ============

    /// Store a new active index; returns true if it changed
    fn set_active(&mut self, index: Option<usize>, events: &mut Vec<SyncEvent>) -> bool {
        if index == self.active {
            return false;
        }

        let previous = self.highlighted();
        self.active = index;
        let current = self.highlighted();

        tracing::debug!(
            "update {:?} -> {:?} at {:?}",
            previous,
            self.active,
            self.last_time
        );
        if previous != current {
            events.push(SyncEvent::ActiveChanged { previous, current });
        }
        true
    }

    fn pulse_deadline(&self, now: Instant) -> Instant {
        let pulse = self.settings.selection_pulse();
        now.checked_add(pulse).unwrap_or_else(|| {
            let fallback = SyncSettings::default().selection_pulse();
            tracing::warn!("Selection pulse {:?} out of range, using {:?}", pulse, fallback);
            now + fallback
        })
    }

    fn highlight_of(&self, index: Option<usize>) -> Option<usize> {
        index.filter(|&i| self.timeline.is_highlightable(i))
    }

    /// Scroll command for an index change while following
    ///
    /// Line-level lyrics keep the preceding line at the anchor so the next
    /// one is visible as it arrives; word-timed lyrics anchor the active line.
    fn follow_scroll(&self) -> Option<SyncEvent> {
        let active = self.active?;
        let target = match self.timeline.kind() {
            TimelineKind::Line => active.saturating_sub(1),
            TimelineKind::WordTimed => active,
        };
        let anchor = if target > 0 {
            ScrollAnchor::Highlight(self.settings.highlight_anchor)
        } else {
            ScrollAnchor::Top
        };
        Some(SyncEvent::ScrollTo {
            target,
            anchor,
            active,
        })
    }
}

impl Default for SyncDriver {
    fn default() -> Self {
        Self::new(SyncSettings::default())
    }
}

impl std::fmt::Debug for SyncDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncDriver")
            .field("entries", &self.timeline.len())
            .field("kind", &self.timeline.kind())
            .field("active", &self.active)
            .field("follow", &self.follow.mode())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
