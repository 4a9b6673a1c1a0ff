//! VAD stage: suppress segments that fall in detected non-speech regions.
//!
//! Segments with no overlap against the merged speech intervals are dropped;
//! segments extending into silence are clamped to the speech edges; a segment
//! spanning a confirmed internal silence is split at the detected boundaries
//! so no output segment spans silence longer than the configured minimum.

use crate::config::VadConfig;
use crate::error::Result;
use crate::pipeline::breaks;
use crate::pipeline::stage::{Stage, StageContext, StageOutcome};
use crate::segment::{Segment, SpeechInterval, Word};
use crate::vad::merge_intervals;
use tracing::debug;

pub struct VadStage {
    config: VadConfig,
}

impl VadStage {
    pub fn new(config: VadConfig) -> Self {
        Self { config }
    }

    fn process_segment(&self, segment: Segment, merged: &[SpeechInterval], out: &mut Vec<Segment>) {
        let overlapping: Vec<SpeechInterval> = merged
            .iter()
            .filter(|iv| iv.overlaps(segment.start, segment.end))
            .copied()
            .collect();

        match overlapping.len() {
            0 => {
                debug!(
                    start = segment.start,
                    end = segment.end,
                    "dropping segment with no speech overlap"
                );
            }
            1 => out.push(clamp_segment(segment, overlapping[0])),
            _ => split_at_silence(segment, &overlapping, out),
        }
    }
}

impl Stage for VadStage {
    fn name(&self) -> &'static str {
        "vad"
    }

    fn apply(&self, segments: Vec<Segment>, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        if !self.config.enabled {
            return Ok(StageOutcome::Skipped(segments));
        }

        let intervals = match ctx.voice.intervals() {
            Ok(intervals) => intervals,
            Err(reason) => {
                return Ok(StageOutcome::Degraded {
                    segments,
                    reason: reason.to_string(),
                });
            }
        };

        let merged = merge_intervals(intervals, self.config.min_silence_duration);
        let mut out = Vec::with_capacity(segments.len());
        for segment in segments {
            self.process_segment(segment, &merged, &mut out);
        }
        Ok(StageOutcome::Applied(out))
    }
}

/// Clamps a segment's time bounds to one overlapping speech interval. The
/// text is never altered; word times are clamped into the new bounds.
fn clamp_segment(mut segment: Segment, interval: SpeechInterval) -> Segment {
    let start = segment.start.max(interval.start);
    let end = segment.end.min(interval.end);
    if let Some(words) = &mut segment.words {
        for word in words {
            word.start = word.start.clamp(start, end);
            word.end = word.end.clamp(start, end);
        }
    }
    segment.start = start;
    segment.end = end;
    segment
}

/// Splits a segment spanning one or more confirmed silences into one
/// sub-segment per overlapping speech interval.
///
/// With word timing, words follow the interval containing their midpoint;
/// without it, text is apportioned by each interval's share of the speech
/// time, breaking at punctuation or whitespace. Text with no break point at
/// all cannot be apportioned, so it stays one clamped segment.
fn split_at_silence(segment: Segment, overlapping: &[SpeechInterval], out: &mut Vec<Segment>) {
    let ranges: Vec<SpeechInterval> = overlapping
        .iter()
        .map(|iv| SpeechInterval::new(iv.start.max(segment.start), iv.end.min(segment.end)))
        .filter(|iv| iv.duration() > 0.0)
        .collect();

    if let Some(words) = segment.words.clone() {
        split_words_by_range(&segment, words, &ranges, out);
        return;
    }

    let text = segment.text.trim().to_string();
    let total_chars = text.chars().count();
    let speech_total: f64 = ranges.iter().map(SpeechInterval::duration).sum();
    if total_chars == 0 || speech_total <= 0.0 {
        return;
    }
    let tolerance = (total_chars / 3).max(2);

    let mut remaining = text;
    let mut consumed = 0.0;
    let mut pieces: Vec<(SpeechInterval, String)> = Vec::new();
    for (i, range) in ranges.iter().enumerate() {
        if i + 1 == ranges.len() {
            pieces.push((*range, remaining));
            break;
        }
        consumed += range.duration();
        let remaining_chars = remaining.chars().count();
        let already = total_chars - remaining_chars;
        let target_abs =
            ((consumed / speech_total) * total_chars as f64).round() as usize;
        let ideal = target_abs.saturating_sub(already).min(remaining_chars);

        match breaks::choose_break(&remaining, ideal, tolerance) {
            Some(pos) => {
                let (left, right) = breaks::split_at_char(&remaining, pos);
                pieces.push((*range, left));
                remaining = right;
            }
            None => {
                // Unbreakable token: keep everything together on one segment
                // clamped to the full speech extent.
                let first = ranges[0];
                let last = ranges[ranges.len() - 1];
                out.push(clamp_segment(
                    segment.clone(),
                    SpeechInterval::new(first.start, last.end),
                ));
                return;
            }
        }
    }

    for (range, text) in pieces {
        if !text.trim().is_empty() {
            out.push(Segment::new(text, range.start, range.end));
        }
    }
}

fn split_words_by_range(
    segment: &Segment,
    words: Vec<Word>,
    ranges: &[SpeechInterval],
    out: &mut Vec<Segment>,
) {
    let mut buckets: Vec<Vec<Word>> = vec![Vec::new(); ranges.len()];
    for word in words {
        let mid = word.midpoint();
        let index = ranges
            .iter()
            .position(|r| mid >= r.start && mid < r.end)
            .unwrap_or_else(|| nearest_range(ranges, mid));
        buckets[index].push(word);
    }

    for (range, bucket) in ranges.iter().zip(buckets) {
        let text: String = bucket.iter().map(|w| w.text.as_str()).collect();
        let text = text.trim().to_string();
        if text.is_empty() {
            debug!(
                start = range.start,
                end = range.end,
                "dropping speech range with no words from segment at {:.3}",
                segment.start
            );
            continue;
        }
        let mut sub = Segment::with_words(text, range.start, range.end, bucket);
        if let Some(words) = &mut sub.words {
            for word in words {
                word.start = word.start.clamp(range.start, range.end);
                word.end = word.end.clamp(range.start, range.end);
            }
        }
        out.push(sub);
    }
}

fn nearest_range(ranges: &[SpeechInterval], t: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, range) in ranges.iter().enumerate() {
        let distance = if t < range.start {
            range.start - t
        } else {
            t - range.end
        };
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}
