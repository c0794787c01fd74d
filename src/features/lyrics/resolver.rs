//! Active-entry resolution
//!
//! Maps a playback time to the active entry of a timeline. Pure: the
//! timeline is never mutated and repeated calls with the same inputs agree.
//!
//! The two timeline kinds use different gap policies:
//! - Line-level: entry `i` is active from its activation time until the next
//!   entry activates. Times at or below the zero threshold force entry 0.
//! - Word-timed: entry `i` is active inside `[begin, end)`. Outside every
//!   interval the previous index is kept, so a line stays lit through a gap.

use super::timeline::Timeline;
use super::types::{LyricEntry, TimelineKind, WordSpan};

/// Playback times at or below this force entry 0 on line-level timelines
pub const ZERO_TIME_THRESHOLD: f64 = 0.1;

/// Resolve the active entry using the default zero threshold
pub fn resolve(timeline: &Timeline, time: f64, previous: Option<usize>) -> Option<usize> {
    resolve_with_threshold(timeline, time, previous, ZERO_TIME_THRESHOLD)
}

/// Resolve the active entry for `time`
///
/// Returns `None` only for an empty timeline or when nothing has been
/// active yet and nothing matches.
pub fn resolve_with_threshold(
    timeline: &Timeline,
    time: f64,
    previous: Option<usize>,
    zero_threshold: f64,
) -> Option<usize> {
    if timeline.is_empty() {
        return None;
    }

    match timeline.kind() {
        TimelineKind::Line => {
            if time <= zero_threshold {
                return Some(0);
            }
            resolve_line(timeline.entries(), time).or(previous)
        }
        TimelineKind::WordTimed => resolve_word_timed(timeline.entries(), time).or(previous),
    }
}

/// Last entry whose activation time is at or before `time`
///
/// Equal activation times resolve to the last of the group, since an entry
/// is only active while the next one has not yet activated.
fn resolve_line(entries: &[LyricEntry], time: f64) -> Option<usize> {
    let started = entries.partition_point(|entry| entry.activation_time() <= time);
    started.checked_sub(1)
}

/// First entry in scan order whose interval contains `time`
fn resolve_word_timed(entries: &[LyricEntry], time: f64) -> Option<usize> {
    // Entries are sorted by begin time, so nothing past this point can match
    let started = entries.partition_point(|entry| entry.activation_time() <= time);

    entries[..started]
        .iter()
        .position(|entry| entry.as_word_timed().is_some_and(|line| line.contains(time)))
}

/// Index of the word span being sung at `time`
///
/// Words that already ended keep their place until the next word starts,
/// so the highlight does not blink between adjacent words.
pub fn active_word(words: &[WordSpan], time: f64) -> Option<usize> {
    let started = words.partition_point(|word| word.start_offset <= time);
    let candidate = started.checked_sub(1)?;

    if words[candidate].end_offset > time || words.get(started).is_some() {
        Some(candidate)
    } else {
        None
    }
}

/// Progress of a word span at `time`, clamped to `0.0..=1.0`
pub fn word_progress(word: &WordSpan, time: f64) -> f64 {
    let duration = word.end_offset - word.start_offset;
    if duration <= 0.0 {
        return if time >= word.start_offset { 1.0 } else { 0.0 };
    }
    ((time - word.start_offset) / duration).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lyrics::types::{RawLine, RawWordLine};

    fn lines(times: &[f64]) -> Timeline {
        Timeline::from_lines(
            times
                .iter()
                .map(|&t| RawLine::new(t, format!("line at {}", t)))
                .collect(),
        )
        .unwrap()
    }

    fn word_lines(bounds: &[(f64, f64)]) -> Timeline {
        Timeline::from_word_lines(
            bounds
                .iter()
                .map(|&(begin, end)| {
                    RawWordLine::new(begin, end, vec![WordSpan::new("w", begin, end)])
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_line_sequence() {
        let timeline = lines(&[0.0, 2.0, 4.0]);
        let mut active = None;
        let mut seen = Vec::new();
        for t in [0.0, 1.9, 2.0, 5.0] {
            active = resolve(&timeline, t, active);
            seen.push(active);
        }
        assert_eq!(seen, vec![Some(0), Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_zero_time_override() {
        let timeline = Timeline::from_lines(vec![
            RawLine::new(0.2, ""),
            RawLine::new(2.0, "b"),
            RawLine::new(4.0, "c"),
        ])
        .unwrap();
        assert_eq!(resolve(&timeline, 0.05, Some(2)), Some(0));
        assert_eq!(resolve(&timeline, -0.5, None), Some(0));
        assert_eq!(resolve(&timeline, 0.1, Some(1)), Some(0));
    }

    #[test]
    fn test_line_before_first_entry_keeps_previous() {
        let timeline = lines(&[1.0, 2.0]);
        assert_eq!(resolve(&timeline, 0.5, None), None);
        assert_eq!(resolve(&timeline, 0.5, Some(1)), Some(1));
    }

    #[test]
    fn test_line_boundary_property() {
        let times = [0.0, 0.5, 0.5, 3.25, 7.0, 11.5];
        let timeline = lines(&times);
        let mut t = 0.11;
        while t < 15.0 {
            let i = resolve(&timeline, t, None).unwrap();
            assert!(times[i] <= t, "entry {} starts after {}", i, t);
            assert!(i == times.len() - 1 || times[i + 1] > t);
            t += 0.07;
        }
    }

    #[test]
    fn test_equal_times_resolve_to_last() {
        let timeline = lines(&[0.0, 1.0, 1.0, 2.0]);
        assert_eq!(resolve(&timeline, 1.0, None), Some(2));
    }

    #[test]
    fn test_custom_threshold() {
        let timeline = lines(&[0.0, 0.2]);
        assert_eq!(resolve_with_threshold(&timeline, 0.3, None, 0.5), Some(0));
        assert_eq!(resolve_with_threshold(&timeline, 0.3, None, 0.0), Some(1));
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::empty();
        assert_eq!(resolve(&timeline, 0.0, None), None);
        assert_eq!(resolve(&timeline, 10.0, Some(3)), None);
    }

    #[test]
    fn test_word_timed_gap_retains_previous() {
        let timeline = word_lines(&[(1.0, 3.0), (3.0, 3.5)]);
        let mut active = None;
        let mut seen = Vec::new();
        for t in [2.9, 3.0, 4.0] {
            active = resolve(&timeline, t, active);
            seen.push(active);
        }
        assert_eq!(seen, vec![Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_word_timed_before_first_line() {
        let timeline = word_lines(&[(1.0, 3.0)]);
        assert_eq!(resolve(&timeline, 0.0, None), None);
        assert_eq!(resolve(&timeline, 0.0, Some(0)), Some(0));
    }

    #[test]
    fn test_word_timed_overlap_first_wins() {
        let timeline = word_lines(&[(1.0, 5.0), (2.0, 4.0), (2.5, 6.0)]);
        assert_eq!(resolve(&timeline, 3.0, None), Some(0));
        assert_eq!(resolve(&timeline, 5.5, Some(0)), Some(2));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let timeline = word_lines(&[(1.0, 3.0), (3.0, 3.5)]);
        let before = timeline.clone();
        for t in [0.0, 1.0, 3.2, 9.0] {
            let first = resolve(&timeline, t, Some(1));
            let second = resolve(&timeline, t, Some(1));
            assert_eq!(first, second);
        }
        assert_eq!(timeline, before);
    }

    #[test]
    fn test_active_word() {
        let words = vec![
            WordSpan::new("a", 1.0, 1.4),
            WordSpan::new("b", 1.5, 2.0),
            WordSpan::new("c", 2.0, 2.5),
        ];
        assert_eq!(active_word(&words, 0.9), None);
        assert_eq!(active_word(&words, 1.2), Some(0));
        assert_eq!(active_word(&words, 1.45), Some(0));
        assert_eq!(active_word(&words, 2.0), Some(2));
        assert_eq!(active_word(&words, 2.6), None);
    }

    #[test]
    fn test_word_progress() {
        let word = WordSpan::new("a", 1.0, 2.0);
        assert_eq!(word_progress(&word, 0.0), 0.0);
        assert_eq!(word_progress(&word, 1.5), 0.5);
        assert_eq!(word_progress(&word, 3.0), 1.0);
        assert_eq!(word_progress(&WordSpan::new("b", 1.0, 1.0), 1.0), 1.0);
    }
}
