//! Follow-state controller
//!
//! Decides whether playback-driven index changes scroll the view:
//! - `Following`: every active-index change scrolls
//! - `Overridden`: the user holds the view; changes are tracked silently
//!
//! Releasing a gesture arms a one-shot resume deadline. The owner polls
//! `poll_resume` with the current instant to perform the transition back.

use std::time::{Duration, Instant};

/// Follow state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowMode {
    /// Auto-following playback
    #[default]
    Following,
    /// User is scrolling or recently scrolled
    Overridden,
}

/// Default delay before returning to follow mode after a gesture ends
pub const DEFAULT_RESUME_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct FollowController {
    mode: FollowMode,
    resume_delay: Duration,
    /// At most one resume is ever pending
    resume_at: Option<Instant>,
}

impl FollowController {
    pub fn new(resume_delay: Duration) -> Self {
        Self {
            mode: FollowMode::Following,
            resume_delay,
            resume_at: None,
        }
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == FollowMode::Following
    }

    pub fn resume_delay(&self) -> Duration {
        self.resume_delay
    }

    pub fn set_resume_delay(&mut self, delay: Duration) {
        self.resume_delay = delay;
    }

    /// Deadline of the pending resume, if armed
    pub fn pending_resume(&self) -> Option<Instant> {
        self.resume_at
    }

    /// Whether an active-index change should scroll the view
    pub fn should_scroll(&self) -> bool {
        self.is_following()
    }

    /// User started a gesture
    ///
    /// Cancels any pending resume. Returns true if the mode changed.
    pub fn gesture_start(&mut self) -> bool {
        self.resume_at = None;
        let changed = self.mode != FollowMode::Overridden;
        self.mode = FollowMode::Overridden;
        changed
    }

    /// User released a gesture; arms the resume deadline
    ///
    /// Ignored while following (no gesture in progress). A repeated release
    /// re-arms the single deadline instead of adding another.
    pub fn gesture_end(&mut self, now: Instant) -> Option<Instant> {
        if self.mode != FollowMode::Overridden {
            return None;
        }
        let deadline = now.checked_add(self.resume_delay).unwrap_or_else(|| {
            tracing::warn!(
                "Resume delay {:?} out of range, using {:?}",
                self.resume_delay,
                DEFAULT_RESUME_DELAY
            );
            now + DEFAULT_RESUME_DELAY
        });
        self.resume_at = Some(deadline);
        Some(deadline)
    }

    /// Return to follow mode once the resume deadline has passed
    ///
    /// Returns true exactly once per armed deadline.
    pub fn poll_resume(&mut self, now: Instant) -> bool {
        match self.resume_at {
            Some(deadline) if deadline <= now => {
                self.resume_at = None;
                self.mode = FollowMode::Following;
                true
            }
            _ => false,
        }
    }

    /// Back to the initial state, dropping any pending resume
    pub fn reset(&mut self) {
        self.mode = FollowMode::Following;
        self.resume_at = None;
    }
}

impl Default for FollowController {
    fn default() -> Self {
        Self::new(DEFAULT_RESUME_DELAY)
    }
}
