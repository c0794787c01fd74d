//! Lyric timeline
//!
//! An ordered, immutable list of indexed lyric entries. Built once from
//! loader output; a reload builds a new `Timeline` instead of mutating one.

use super::types::{
    LineEntry, LyricEntry, RawLine, RawLyrics, RawWordLine, TimelineKind, WordSpan,
    WordTimedEntry,
};

/// Slack allowed when checking word spans against their line bounds
const BOUNDS_EPSILON: f64 = 1e-6;

/// Errors that can occur when building a timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// Entry `index` activates before the entry preceding it
    UnsortedInput { index: usize, time: f64, previous: f64 },
    /// Entry `index` has inconsistent bounds
    MalformedEntry { index: usize, reason: String },
}

impl std::fmt::Display for TimelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimelineError::UnsortedInput {
                index,
                time,
                previous,
            } => write!(
                f,
                "Unsorted input: entry {} at {}s precedes previous entry at {}s",
                index, time, previous
            ),
            TimelineError::MalformedEntry { index, reason } => {
                write!(f, "Malformed entry {}: {}", index, reason)
            }
        }
    }
}

impl std::error::Error for TimelineError {}

/// Ordered lyric timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    kind: TimelineKind,
    entries: Vec<LyricEntry>,
}

impl Timeline {
    /// Build a timeline from loader output, validating order and bounds
    pub fn new(raw: RawLyrics) -> Result<Self, TimelineError> {
        match raw {
            RawLyrics::Lines(lines) => Self::from_lines(lines),
            RawLyrics::WordTimed(lines) => Self::from_word_lines(lines),
        }
    }

    /// An empty line-level timeline
    pub fn empty() -> Self {
        Self {
            kind: TimelineKind::Line,
            entries: Vec::new(),
        }
    }

    pub fn from_lines(lines: Vec<RawLine>) -> Result<Self, TimelineError> {
        let mut entries = Vec::with_capacity(lines.len());
        let mut previous: Option<f64> = None;

        for (index, line) in lines.into_iter().enumerate() {
            if !line.time.is_finite() || line.time < 0.0 {
                return Err(TimelineError::MalformedEntry {
                    index,
                    reason: format!("activation time {} is not a non-negative number", line.time),
                });
            }
            check_order(index, line.time, previous)?;
            previous = Some(line.time);

            entries.push(LyricEntry::Line(LineEntry {
                index,
                text: line.text,
                activation_time: line.time,
            }));
        }

        Ok(Self {
            kind: TimelineKind::Line,
            entries,
        })
    }

    pub fn from_word_lines(lines: Vec<RawWordLine>) -> Result<Self, TimelineError> {
        let mut entries = Vec::with_capacity(lines.len());
        let mut previous: Option<f64> = None;

        for (index, line) in lines.into_iter().enumerate() {
            check_word_line(index, &line)?;
            check_order(index, line.begin_time, previous)?;
            previous = Some(line.begin_time);

            entries.push(LyricEntry::WordTimed(WordTimedEntry {
                index,
                begin_time: line.begin_time,
                end_time: line.end_time,
                main_words: line.main_words,
                translation: line.translation.filter(|t| !t.is_empty()),
                romanization: line.romanization.filter(|r| !r.is_empty()),
                background_words: line.background_words,
                position: line.position,
            }));
        }

        Ok(Self {
            kind: TimelineKind::WordTimed,
            entries,
        })
    }

    pub fn kind(&self) -> TimelineKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LyricEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[LyricEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LyricEntry> {
        self.entries.iter()
    }

    /// Whether `index` names an entry that may be highlighted
    pub fn is_highlightable(&self, index: usize) -> bool {
        self.get(index).is_some_and(|entry| !entry.is_spacer())
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a LyricEntry;
    type IntoIter = std::slice::Iter<'a, LyricEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn check_order(index: usize, time: f64, previous: Option<f64>) -> Result<(), TimelineError> {
    match previous {
        Some(previous) if time < previous => Err(TimelineError::UnsortedInput {
            index,
            time,
            previous,
        }),
        _ => Ok(()),
    }
}

fn check_word_line(index: usize, line: &RawWordLine) -> Result<(), TimelineError> {
    let malformed = |reason: String| TimelineError::MalformedEntry { index, reason };

    if !line.begin_time.is_finite() || !line.end_time.is_finite() || line.begin_time < 0.0 {
        return Err(malformed(format!(
            "bounds [{}, {}) are not non-negative numbers",
            line.begin_time, line.end_time
        )));
    }
    if line.begin_time >= line.end_time {
        return Err(malformed(format!(
            "begin time {} is not before end time {}",
            line.begin_time, line.end_time
        )));
    }

    let background = line.background_words.iter().flatten();
    for word in line.main_words.iter().chain(background) {
        check_word_span(word, line.begin_time, line.end_time).map_err(&malformed)?;
    }
    Ok(())
}

fn check_word_span(word: &WordSpan, begin: f64, end: f64) -> Result<(), String> {
    if !word.start_offset.is_finite() || !word.end_offset.is_finite() {
        return Err(format!("word {:?} has non-finite bounds", word.text));
    }
    if word.start_offset > word.end_offset {
        return Err(format!(
            "word {:?} starts at {} after it ends at {}",
            word.text, word.start_offset, word.end_offset
        ));
    }
    if word.start_offset < begin - BOUNDS_EPSILON || word.end_offset > end + BOUNDS_EPSILON {
        return Err(format!(
            "word {:?} [{}, {}] lies outside line bounds [{}, {}]",
            word.text, word.start_offset, word.end_offset, begin, end
        ));
    }
    Ok(())
}
