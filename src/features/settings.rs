//! Sync settings persistence
//!
//! Handles saving and loading the tunables of the lyric sync engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::lyrics::{AnchorPoint, LinePosition};
use super::lyrics::resolver::ZERO_TIME_THRESHOLD;

/// Lyric sync settings
///
/// All timing values are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Delay after a gesture ends before auto-follow resumes
    pub resume_delay: f64,
    /// How long a tapped entry stays "selected"
    pub selection_pulse: f64,
    /// Line-level playback times at or below this force the first entry
    pub zero_time_threshold: f64,
    /// Where the followed entry is aligned within the view
    pub highlight_anchor: AnchorPoint,
    /// Scale anchor for line text (leading / center / trailing)
    pub font_anchor: AnchorPoint,
}

const DEFAULT_RESUME_DELAY: f64 = 1.0;
const DEFAULT_SELECTION_PULSE: f64 = 0.4;

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            resume_delay: DEFAULT_RESUME_DELAY,
            selection_pulse: DEFAULT_SELECTION_PULSE,
            zero_time_threshold: ZERO_TIME_THRESHOLD,
            highlight_anchor: AnchorPoint::default(),
            font_anchor: AnchorPoint::LEADING,
        }
    }
}

impl SyncSettings {
    /// Resume delay as a `Duration`, falling back to the default if invalid
    pub fn resume_delay(&self) -> Duration {
        seconds_or(self.resume_delay, DEFAULT_RESUME_DELAY)
    }

    /// Selection pulse lifetime as a `Duration`, falling back to the default if invalid
    pub fn selection_pulse(&self) -> Duration {
        seconds_or(self.selection_pulse, DEFAULT_SELECTION_PULSE)
    }

    /// Restart threshold, falling back to the default if negative or not finite
    pub fn zero_time_threshold(&self) -> f64 {
        if self.zero_time_threshold.is_finite() && self.zero_time_threshold >= 0.0 {
            self.zero_time_threshold
        } else {
            tracing::warn!(
                "Invalid zero-time threshold {} in settings, using {}",
                self.zero_time_threshold,
                ZERO_TIME_THRESHOLD
            );
            ZERO_TIME_THRESHOLD
        }
    }

    /// Font anchor for an entry on the given side
    pub fn font_anchor_for(&self, position: LinePosition) -> AnchorPoint {
        self.font_anchor.for_position(position)
    }

    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "lyrics-sync", "LyricsSync")
            .map(|dirs| dirs.config_dir().join("sync.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        Self::file_path()
            .and_then(|path| Self::load_from_file(&path).ok())
            .unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(path) = Self::file_path() {
            self.save_to_file(&path)
        } else {
            Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            ))
        }
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SettingsError::Io(e.to_string()))?;
        Ok(())
    }
}

fn seconds_or(value: f64, default: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_else(|_| {
        tracing::warn!("Invalid duration {}s in settings, using {}s", value, default);
        Duration::from_secs_f64(default)
    })
}

/// Errors that can occur with settings
#[derive(Debug, Clone)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}
