//! Lyric timeline data types
//!
//! Two families live here:
//! - Raw records (`RawLine`, `RawWordLine`, `RawLyrics`) as produced by an
//!   external loader. Times are seconds, serde-friendly.
//! - Indexed entries (`LyricEntry` and its variants) owned by a `Timeline`.

use serde::{Deserialize, Serialize};

/// A single timed word span
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSpan {
    /// The word text
    pub text: String,
    /// Start time in seconds (absolute, not relative to the line)
    pub start_offset: f64,
    /// End time in seconds (absolute, not relative to the line)
    pub end_offset: f64,
}

impl WordSpan {
    pub fn new(text: impl Into<String>, start_offset: f64, end_offset: f64) -> Self {
        Self {
            text: text.into(),
            start_offset,
            end_offset,
        }
    }

    /// Check if the word is empty (whitespace only)
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Which side of the view a word-timed line belongs to (duet layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePosition {
    #[default]
    Primary,
    Secondary,
}

/// Raw line-level record from an LRC-style loader
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLine {
    /// Activation time in seconds
    pub time: f64,
    /// Line text, empty for a spacer
    #[serde(default)]
    pub text: String,
}

impl RawLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// Raw word-timed record from a TTML-style loader
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWordLine {
    pub begin_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub main_words: Vec<WordSpan>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub romanization: Option<String>,
    #[serde(default)]
    pub background_words: Option<Vec<WordSpan>>,
    #[serde(default)]
    pub position: LinePosition,
}

impl RawWordLine {
    pub fn new(begin_time: f64, end_time: f64, main_words: Vec<WordSpan>) -> Self {
        Self {
            begin_time,
            end_time,
            main_words,
            ..Default::default()
        }
    }
}

/// Loader output: one homogeneous, ordered list of raw records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum RawLyrics {
    Lines(Vec<RawLine>),
    WordTimed(Vec<RawWordLine>),
}

impl RawLyrics {
    pub fn len(&self) -> usize {
        match self {
            RawLyrics::Lines(lines) => lines.len(),
            RawLyrics::WordTimed(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which of the two lyric shapes a timeline holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineKind {
    /// Line-level lyrics (LRC): full coverage, no gaps
    Line,
    /// Word-timed lyrics (TTML): bounded intervals, gaps allowed
    WordTimed,
}

/// Line-level lyric entry
#[derive(Debug, Clone, PartialEq)]
pub struct LineEntry {
    pub index: usize,
    pub text: String,
    /// Activation time in seconds
    pub activation_time: f64,
}

impl LineEntry {
    /// Empty lines are deliberate spacers
    pub fn is_spacer(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Word-timed lyric entry
#[derive(Debug, Clone, PartialEq)]
pub struct WordTimedEntry {
    pub index: usize,
    pub begin_time: f64,
    pub end_time: f64,
    pub main_words: Vec<WordSpan>,
    pub translation: Option<String>,
    pub romanization: Option<String>,
    pub background_words: Option<Vec<WordSpan>>,
    pub position: LinePosition,
}

impl WordTimedEntry {
    /// Get the main line text by joining all words
    pub fn text(&self) -> String {
        join_words(&self.main_words)
    }

    /// Background vocal text, if any
    pub fn background_text(&self) -> Option<String> {
        self.background_words
            .as_deref()
            .filter(|words| !words.is_empty())
            .map(join_words)
    }

    /// Entries with no visible main words render as spacers
    pub fn is_spacer(&self) -> bool {
        self.main_words.iter().all(WordSpan::is_empty)
    }

    /// Check if `time` falls inside `[begin_time, end_time)`
    pub fn contains(&self, time: f64) -> bool {
        self.begin_time <= time && time < self.end_time
    }
}

fn join_words(words: &[WordSpan]) -> String {
    words.iter().map(|w| w.text.as_str()).collect()
}

/// An indexed entry of a `Timeline`
#[derive(Debug, Clone, PartialEq)]
pub enum LyricEntry {
    Line(LineEntry),
    WordTimed(WordTimedEntry),
}

impl LyricEntry {
    pub fn index(&self) -> usize {
        match self {
            LyricEntry::Line(line) => line.index,
            LyricEntry::WordTimed(line) => line.index,
        }
    }

    /// The instant this entry becomes active, also its seek target
    pub fn activation_time(&self) -> f64 {
        match self {
            LyricEntry::Line(line) => line.activation_time,
            LyricEntry::WordTimed(line) => line.begin_time,
        }
    }

    pub fn is_spacer(&self) -> bool {
        match self {
            LyricEntry::Line(line) => line.is_spacer(),
            LyricEntry::WordTimed(line) => line.is_spacer(),
        }
    }

    /// Display text of the main line
    pub fn text(&self) -> String {
        match self {
            LyricEntry::Line(line) => line.text.clone(),
            LyricEntry::WordTimed(line) => line.text(),
        }
    }

    pub fn position(&self) -> LinePosition {
        match self {
            LyricEntry::Line(_) => LinePosition::Primary,
            LyricEntry::WordTimed(line) => line.position,
        }
    }

    pub fn as_word_timed(&self) -> Option<&WordTimedEntry> {
        match self {
            LyricEntry::WordTimed(line) => Some(line),
            LyricEntry::Line(_) => None,
        }
    }
}
