//! Segment data model shared across the enhancement pipeline.
//!
//! A transcript is an ordered, non-overlapping sequence of [`Segment`]s.
//! Stages consume and produce whole sequences; every stage must preserve the
//! ordering invariant checked by [`verify_sequence`].

use serde::{Deserialize, Serialize};

/// A timestamped span of recognized text.
///
/// Produced by the ASR engine, reshaped (but never re-worded) by pipeline
/// stages. `start`/`end` are seconds from the beginning of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Word-level timing, when the upstream ASR result carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

impl Segment {
    /// Creates a segment without word-level timing.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            words: None,
        }
    }

    /// Creates a segment with word-level timing.
    pub fn with_words(text: impl Into<String>, start: f64, end: f64, words: Vec<Word>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            words: Some(words),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Character count of the trimmed text (Unicode scalar values, not bytes,
    /// so CJK text counts one per character).
    pub fn char_count(&self) -> usize {
        self.text.trim().chars().count()
    }

    /// True when the segment's time range overlaps `[start, end)`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && self.end > start
    }
}

/// A single word with its own timing, nested in a parent segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// A contiguous region of detected voice activity.
///
/// Generated fresh per job from raw audio, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechInterval {
    pub start: f64,
    pub end: f64,
}

impl SpeechInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && self.end > start
    }
}

/// Tolerance for adjacent-boundary comparisons. Keeps exact-touching
/// boundaries produced by proportional arithmetic from tripping the check.
const ORDERING_EPSILON: f64 = 1e-9;

/// Verifies the sequence invariant: every segment well-formed
/// (`0 <= start < end`, non-empty text) and adjacent segments non-overlapping.
///
/// Returns a description of the first violation found.
pub fn verify_sequence(segments: &[Segment]) -> Result<(), String> {
    for (i, seg) in segments.iter().enumerate() {
        if !seg.start.is_finite() || !seg.end.is_finite() {
            return Err(format!("segment {i} has a non-finite boundary"));
        }
        if seg.start < 0.0 {
            return Err(format!("segment {i} starts at {:.3} (< 0)", seg.start));
        }
        if seg.start >= seg.end {
            return Err(format!(
                "segment {i} is inverted or zero-length ({:.3}..{:.3})",
                seg.start, seg.end
            ));
        }
        if seg.text.trim().is_empty() {
            return Err(format!("segment {i} has empty text"));
        }
        if let Some(prev) = i.checked_sub(1).map(|p| &segments[p]) {
            if seg.start < prev.end - ORDERING_EPSILON {
                return Err(format!(
                    "segment {i} starts at {:.3}, before segment {} ends at {:.3}",
                    seg.start,
                    i - 1,
                    prev.end
                ));
            }
        }
    }
    Ok(())
}
