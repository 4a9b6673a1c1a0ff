//! Splitter stage: break segments exceeding duration or character limits.
//!
//! Split points prefer punctuation near the ideal position, then whitespace;
//! a split never lands inside a token. Time is reallocated proportionally to
//! character count (or at word-gap midpoints when word timing exists), so the
//! measured total duration is preserved exactly and sub-segments stay
//! contiguous. Recursion is capped: pathological input (one enormous token)
//! is accepted oversize rather than looped on.

use crate::config::SplitConfig;
use crate::defaults::{DURATION_TOLERANCE_SECS, MAX_SPLIT_DEPTH};
use crate::error::{EnhanceError, Result};
use crate::pipeline::breaks;
use crate::pipeline::stage::{Stage, StageContext, StageOutcome};
use crate::segment::{Segment, Word};

pub struct SplitterStage {
    config: SplitConfig,
}

impl SplitterStage {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    fn violates(&self, segment: &Segment) -> bool {
        segment.duration() > self.config.max_duration + DURATION_TOLERANCE_SECS
            || segment.char_count() > self.config.max_chars
    }

    fn split_into(&self, segment: Segment, depth: u32, out: &mut Vec<Segment>) -> Result<()> {
        if !self.violates(&segment) || depth >= MAX_SPLIT_DEPTH {
            out.push(segment);
            return Ok(());
        }
        match self.split_once(&segment)? {
            Some((left, right)) => {
                self.split_into(left, depth + 1, out)?;
                self.split_into(right, depth + 1, out)
            }
            None => {
                // No valid break point; accepted oversize.
                out.push(segment);
                Ok(())
            }
        }
    }

    /// One binary split at the best break point, or `None` when the text has
    /// no valid break.
    fn split_once(&self, segment: &Segment) -> Result<Option<(Segment, Segment)>> {
        let text = segment.text.trim();
        let total_chars = text.chars().count();
        if total_chars < 2 {
            return Ok(None);
        }

        let ideal = self.ideal_break(segment, total_chars);
        let tolerance = (total_chars / 3).max(2);
        let Some(pos) = breaks::choose_break(text, ideal, tolerance) else {
            return Ok(None);
        };
        let (left_text, right_text) = breaks::split_at_char(text, pos);
        if left_text.is_empty() || right_text.is_empty() {
            return Ok(None);
        }

        let (left, right) = allocate_times(segment, left_text, right_text);
        check_conservation(segment, &left, &right)?;
        Ok(Some((left, right)))
    }

    /// The character position the split should aim for.
    ///
    /// A pure character-count violation aims at the midpoint; a duration
    /// violation aims where the limit first trips, located from word timing
    /// when present and estimated at `char_duration_sec` per character
    /// otherwise. When both limits are violated, whichever trips first in
    /// character order decides.
    fn ideal_break(&self, segment: &Segment, total_chars: usize) -> usize {
        let over_chars = total_chars > self.config.max_chars;
        let over_duration =
            segment.duration() > self.config.max_duration + DURATION_TOLERANCE_SECS;

        let midpoint = total_chars / 2;
        let ideal = match (over_chars, over_duration) {
            (true, false) => midpoint,
            (false, true) => self.duration_trip(segment, total_chars),
            (true, true) => {
                let duration_trip = self.duration_trip(segment, total_chars);
                if duration_trip < self.config.max_chars {
                    duration_trip
                } else {
                    midpoint
                }
            }
            (false, false) => midpoint,
        };
        ideal.clamp(1, total_chars - 1)
    }

    /// Character position where accumulated duration first reaches the limit.
    fn duration_trip(&self, segment: &Segment, total_chars: usize) -> usize {
        if let Some(words) = &segment.words {
            if !words.is_empty() {
                let deadline = segment.start + self.config.max_duration;
                let mut chars = 0usize;
                for word in words {
                    if word.end > deadline {
                        return chars.max(1);
                    }
                    chars += word.text.trim().chars().count();
                }
                return total_chars;
            }
        }

        let estimated = (self.config.max_duration / self.config.char_duration_sec).ceil() as usize;
        if estimated < total_chars {
            estimated
        } else {
            // The flat estimate never trips inside this text; place the trip
            // proportionally on the measured duration instead.
            (total_chars as f64 * self.config.max_duration / segment.duration()).floor() as usize
        }
    }
}

impl Stage for SplitterStage {
    fn name(&self) -> &'static str {
        "split"
    }

    fn apply(&self, segments: Vec<Segment>, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        if !self.config.enabled {
            return Ok(StageOutcome::Skipped(segments));
        }
        let mut out = Vec::with_capacity(segments.len());
        for segment in segments {
            self.split_into(segment, 0, &mut out)?;
        }
        Ok(StageOutcome::Applied(out))
    }
}

/// Computes the boundary time and builds the two sub-segments.
///
/// With word timing the boundary is the midpoint of the word gap nearest the
/// text split; otherwise the original duration is divided proportionally to
/// character count. Either way `left.end == right.start`, so duration is
/// conserved by construction.
fn allocate_times(segment: &Segment, left_text: String, right_text: String) -> (Segment, Segment) {
    let left_chars = left_text.chars().count();
    let right_chars = right_text.chars().count();

    if let Some(words) = &segment.words {
        if words.len() >= 2 {
            let split_index = word_split_index(words, left_chars);
            let gap_mid = (words[split_index].end + words[split_index + 1].start) / 2.0;
            let boundary = clamp_interior(gap_mid, segment.start, segment.end);

            let (left_words, right_words) = partition_words(words, split_index, boundary);
            let left = Segment::with_words(left_text, segment.start, boundary, left_words);
            let right = Segment::with_words(right_text, boundary, segment.end, right_words);
            return (left, right);
        }
    }

    let fraction = left_chars as f64 / (left_chars + right_chars) as f64;
    let boundary = segment.start + segment.duration() * fraction;
    let boundary = clamp_interior(boundary, segment.start, segment.end);
    (
        Segment::new(left_text, segment.start, boundary),
        Segment::new(right_text, boundary, segment.end),
    )
}

/// Index of the last word on the left side: the word gap whose cumulative
/// character count is nearest the text split position.
fn word_split_index(words: &[Word], left_chars: usize) -> usize {
    let mut cumulative = 0usize;
    let mut best = 0usize;
    let mut best_distance = usize::MAX;
    for (i, word) in words.iter().enumerate().take(words.len() - 1) {
        cumulative += word.text.trim().chars().count();
        let distance = cumulative.abs_diff(left_chars);
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

fn partition_words(words: &[Word], split_index: usize, boundary: f64) -> (Vec<Word>, Vec<Word>) {
    let mut left = words[..=split_index].to_vec();
    let mut right = words[split_index + 1..].to_vec();
    for word in &mut left {
        word.start = word.start.min(boundary);
        word.end = word.end.min(boundary);
    }
    for word in &mut right {
        word.start = word.start.max(boundary);
        word.end = word.end.max(boundary);
    }
    (left, right)
}

fn clamp_interior(t: f64, start: f64, end: f64) -> f64 {
    let margin = (end - start) * 1e-3;
    t.clamp(start + margin, end - margin)
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn check_conservation(original: &Segment, left: &Segment, right: &Segment) -> Result<()> {
    let rebuilt = format!(
        "{}{}",
        strip_whitespace(&left.text),
        strip_whitespace(&right.text)
    );
    if rebuilt != strip_whitespace(original.text.trim()) {
        return Err(EnhanceError::InvariantViolation {
            stage: "split",
            message: format!(
                "split text does not reconstruct the original at {:.3}..{:.3}",
                original.start, original.end
            ),
        });
    }
    let drift = (left.duration() + right.duration() - original.duration()).abs();
    if drift > DURATION_TOLERANCE_SECS {
        return Err(EnhanceError::InvariantViolation {
            stage: "split",
            message: format!("split durations drift by {drift:.9}s"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::VoiceSignal;

    fn ctx<'a>() -> StageContext<'a> {
        StageContext {
            audio_duration: None,
            voice: VoiceSignal::NotRequested,
        }
    }

    fn stage(max_duration: f64, max_chars: usize, char_duration_sec: f64) -> SplitterStage {
        SplitterStage::new(SplitConfig {
            enabled: true,
            max_duration,
            max_chars,
            char_duration_sec,
        })
    }

    fn apply(stage: &SplitterStage, segments: Vec<Segment>) -> Vec<Segment> {
        stage.apply(segments, &ctx()).unwrap().into_segments()
    }

    #[test]
    fn compliant_segments_are_untouched() {
        let stage = stage(7.0, 84, 0.4);
        let segments = vec![Segment::new("short and sweet", 0.0, 3.0)];
        assert_eq!(apply(&stage, segments.clone()), segments);
    }

    #[test]
    fn splits_cjk_sentences_at_terminal_marks() {
        // 21 characters over 12 seconds, limit 10 characters: three sentences
        // split at their terminal marks, contiguous, durations summing to 12.
        let stage = stage(7.0, 10, 0.4);
        let segments = vec![Segment::new(
            "今天天气很好。我们去公园玩。孩子们很开心。",
            0.0,
            12.0,
        )];
        let out = apply(&stage, segments);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].text, "今天天气很好。");
        assert_eq!(out[1].text, "我们去公园玩。");
        assert_eq!(out[2].text, "孩子们很开心。");
        for seg in &out {
            assert!(seg.char_count() <= 10);
        }
        assert_eq!(out[0].start, 0.0);
        assert_eq!(out[2].end, 12.0);
        assert_eq!(out[0].end, out[1].start);
        assert_eq!(out[1].end, out[2].start);
        let total: f64 = out.iter().map(Segment::duration).sum();
        assert!((total - 12.0).abs() < 1e-6);
    }

    #[test]
    fn duration_is_conserved_on_every_split() {
        let stage = stage(2.0, 84, 0.1);
        let segments = vec![Segment::new(
            "one two three four five six seven eight nine ten",
            3.0,
            13.0,
        )];
        let out = apply(&stage, segments);
        assert!(out.len() > 1);
        let total: f64 = out.iter().map(Segment::duration).sum();
        assert!((total - 10.0).abs() < 1e-6);
        for pair in out.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < 1e-9);
        }
    }

    #[test]
    fn text_is_conserved_ignoring_whitespace() {
        let stage = stage(7.0, 12, 0.4);
        let original = "alpha beta gamma, delta epsilon. zeta eta theta";
        let segments = vec![Segment::new(original, 0.0, 20.0)];
        let out = apply(&stage, segments);
        let rebuilt: String = out.iter().map(|s| strip_whitespace(&s.text)).collect();
        assert_eq!(rebuilt, strip_whitespace(original));
    }

    #[test]
    fn splitting_is_idempotent() {
        let stage = stage(3.0, 20, 0.2);
        let segments = vec![Segment::new(
            "first clause, second clause. third clause here",
            0.0,
            9.0,
        )];
        let once = apply(&stage, segments);
        let twice = apply(&stage, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn unbreakable_token_is_accepted_oversize() {
        let stage = stage(7.0, 10, 0.4);
        let segments = vec![Segment::new("Pneumonoultramicroscopicsilicovolcanoconiosis", 0.0, 3.0)];
        let out = apply(&stage, segments.clone());
        assert_eq!(out, segments);
    }

    #[test]
    fn word_timing_places_the_boundary_in_the_gap() {
        let words = vec![
            Word::new("alpha ", 0.0, 1.0),
            Word::new("beta ", 1.0, 2.0),
            Word::new("gamma ", 4.0, 5.0),
            Word::new("delta", 5.0, 6.0),
        ];
        let stage = stage(7.0, 12, 0.4);
        let segments = vec![Segment::with_words("alpha beta gamma delta", 0.0, 6.0, words)];
        let out = apply(&stage, segments);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "alpha beta");
        assert_eq!(out[1].text, "gamma delta");
        // Boundary sits in the 2.0..4.0 inter-word gap, not proportionally.
        assert!((out[0].end - 3.0).abs() < 1e-9);
        assert_eq!(out[0].words.as_ref().unwrap().len(), 2);
        assert_eq!(out[1].words.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn recursion_terminates_on_repeating_text() {
        // Every split still violates the limit; the depth cap must stop it.
        let text = "ha ".repeat(400);
        let stage = stage(0.001, 1, 0.4);
        let segments = vec![Segment::new(text, 0.0, 100.0)];
        let out = apply(&stage, segments);
        assert!(!out.is_empty());
        assert!(out.len() <= 1 << MAX_SPLIT_DEPTH);
        let total: f64 = out.iter().map(Segment::duration).sum();
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn disabled_stage_is_skipped() {
        let stage = SplitterStage::new(SplitConfig {
            enabled: false,
            ..SplitConfig::default()
        });
        let segments = vec![Segment::new("x".repeat(500), 0.0, 100.0)];
        let outcome = stage.apply(segments.clone(), &ctx()).unwrap();
        assert_eq!(outcome, StageOutcome::Skipped(segments));
    }

    #[test]
    fn duration_violation_alone_splits_near_estimated_trip() {
        // 40 chars, 20s, limit 5s, 0.25s/char estimate: the limit trips
        // around character 20, so the split should land near the middle.
        let stage = stage(5.0, 84, 0.25);
        let segments = vec![Segment::new(
            "aaaa bbbb cccc dddd eeee ffff gggg hhhh",
            0.0,
            20.0,
        )];
        let out = apply(&stage, segments);
        assert!(out.len() >= 2);
        assert!(out[0].char_count() < 30);
    }
}
