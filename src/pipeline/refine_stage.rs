//! Refiner stage: snap segment and word boundaries onto voice-activity edges.
//!
//! ASR models routinely clip boundaries a few hundred milliseconds early or
//! late. Each boundary is moved to the nearest speech-interval edge within
//! the search window; a refinement that would invert a segment or cross an
//! adjacent boundary is rejected and the original value kept, so ordering
//! always takes precedence over refinement.

use crate::config::RefineConfig;
use crate::error::Result;
use crate::pipeline::stage::{Stage, StageContext, StageOutcome};
use crate::segment::Segment;

pub struct RefinerStage {
    config: RefineConfig,
}

impl RefinerStage {
    pub fn new(config: RefineConfig) -> Self {
        Self { config }
    }
}

impl Stage for RefinerStage {
    fn name(&self) -> &'static str {
        "refine"
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

        let mut edges: Vec<f64> = intervals
            .iter()
            .flat_map(|iv| [iv.start, iv.end])
            .collect();
        edges.sort_by(f64::total_cmp);

        let window = f64::from(self.config.search_window_ms) / 1000.0;
        let audio_end = ctx.audio_duration.unwrap_or(f64::INFINITY);

        let mut out = segments;
        let mut prev_end = 0.0_f64;
        for i in 0..out.len() {
            // Segments to the right have not been touched yet, so the
            // neighbor's original start is the crossing limit.
            let next_start = out.get(i + 1).map_or(audio_end, |next| next.start);
            prev_end = refine_segment(&mut out[i], prev_end, next_start, &edges, window);
        }

        Ok(StageOutcome::Applied(out))
    }
}

/// Refines one segment in place. Returns the accepted end boundary, which
/// becomes the floor for the next segment's start.
fn refine_segment(
    segment: &mut Segment,
    prev_end: f64,
    next_start: f64,
    edges: &[f64],
    window: f64,
) -> f64 {
    let has_words = segment
        .words
        .as_ref()
        .is_some_and(|words| !words.is_empty());

    if has_words {
        // Word boundaries are refined first; the segment bounds are then the
        // extent of the refined words, keeping both representations aligned.
        if let Some(words) = &mut segment.words {
            let count = words.len();
            let mut prev = prev_end;
            for j in 0..count {
                let start_cap = words[j].end;
                words[j].start = refine_boundary(words[j].start, prev, start_cap, false, edges, window);

                let end_cap = if j + 1 < count {
                    words[j + 1].start
                } else {
                    next_start
                };
                words[j].end = refine_boundary(words[j].end, words[j].start, end_cap, true, edges, window);
                prev = words[j].end;
            }
            segment.start = words[0].start;
            segment.end = words[count - 1].end;
        }
    } else {
        segment.start =
            refine_boundary(segment.start, prev_end, segment.end, false, edges, window);
        segment.end =
            refine_boundary(segment.end, segment.start, next_start, true, edges, window);
    }
    segment.end
}

/// Snaps one boundary to the nearest edge within the window, keeping the
/// original when no edge is in range or the snapped value would violate
/// ordering. `upper_inclusive` distinguishes an end boundary (may touch the
/// next start) from a start boundary (must stay strictly below its end).
fn refine_boundary(
    original: f64,
    lower: f64,
    upper: f64,
    upper_inclusive: bool,
    edges: &[f64],
    window: f64,
) -> f64 {
    let Some(candidate) = nearest_edge(edges, original, window) else {
        return original;
    };
    let fits_upper = if upper_inclusive {
        candidate <= upper
    } else {
        candidate < upper
    };
    let fits_lower = if upper_inclusive {
        candidate > lower
    } else {
        candidate >= lower
    };
    if fits_lower && fits_upper {
        candidate
    } else {
        original
    }
}

/// Nearest edge within `window` seconds of `t`, or `None`. Ties resolve to
/// the earlier edge.
fn nearest_edge(edges: &[f64], t: f64, window: f64) -> Option<f64> {
    let idx = edges.partition_point(|e| *e < t);
    let before = idx.checked_sub(1).map(|i| edges[i]);
    let after = edges.get(idx).copied();

    let best = match (before, after) {
        (Some(b), Some(a)) => {
            if (t - b) <= (a - t) {
                b
            } else {
                a
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return None,
    };
    ((best - t).abs() <= window).then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::VoiceSignal;
    use crate::segment::{SpeechInterval, Word};

    fn ctx<'a>(intervals: &'a [SpeechInterval]) -> StageContext<'a> {
        StageContext {
            audio_duration: Some(100.0),
            voice: VoiceSignal::Available {
                engine: "mock",
                intervals,
            },
        }
    }

    fn stage() -> RefinerStage {
        RefinerStage::new(RefineConfig::default())
    }

    #[test]
    fn snaps_boundaries_to_nearby_speech_edges() {
        // Speech starts at 1.0; ASR clipped the start to 0.8 (within 300ms).
        let intervals = [SpeechInterval::new(1.0, 3.0)];
        let segments = vec![Segment::new("hello", 0.8, 3.2)];
        let out = stage()
            .apply(segments, &ctx(&intervals))
            .unwrap()
            .into_segments();
        assert_eq!(out[0].start, 1.0);
        assert_eq!(out[0].end, 3.0);
    }

    #[test]
    fn leaves_boundary_alone_outside_window() {
        let intervals = [SpeechInterval::new(5.0, 8.0)];
        let segments = vec![Segment::new("far", 0.5, 2.0)];
        let out = stage()
            .apply(segments, &ctx(&intervals))
            .unwrap()
            .into_segments();
        assert_eq!(out[0].start, 0.5);
        assert_eq!(out[0].end, 2.0);
    }

    #[test]
    fn rejects_refinement_that_would_invert_segment() {
        // The only edge near this short segment's start lies past its end.
        let intervals = [SpeechInterval::new(1.25, 5.0)];
        let segments = vec![Segment::new("short", 1.0, 1.2)];
        let out = stage()
            .apply(segments, &ctx(&intervals))
            .unwrap()
            .into_segments();
        // The start keeps its original value; the end may still snap outward.
        assert_eq!(out[0].start, 1.0);
        assert_eq!(out[0].end, 1.25);
        assert!(out[0].start < out[0].end);
    }

    #[test]
    fn rejects_refinement_that_would_cross_neighbor() {
        // Snapping the first end to 2.2 would cross the second start (2.0).
        let intervals = [SpeechInterval::new(0.0, 2.2)];
        let segments = vec![
            Segment::new("one", 0.0, 1.95),
            Segment::new("two", 2.0, 3.0),
        ];
        let out = stage()
            .apply(segments, &ctx(&intervals))
            .unwrap()
            .into_segments();
        assert_eq!(out[0].end, 1.95);
        assert!(out[0].end <= out[1].start);
    }

    #[test]
    fn word_boundaries_drive_segment_bounds() {
        let intervals = [SpeechInterval::new(1.0, 1.8), SpeechInterval::new(2.0, 2.9)];
        let words = vec![Word::new("hi ", 0.9, 1.7), Word::new("there", 2.1, 3.0)];
        let segments = vec![Segment::with_words("hi there", 0.9, 3.0, words)];
        let out = stage()
            .apply(segments, &ctx(&intervals))
            .unwrap()
            .into_segments();

        let words = out[0].words.as_ref().unwrap();
        assert_eq!(words[0].start, 1.0);
        assert_eq!(words[0].end, 1.8);
        assert_eq!(words[1].start, 2.0);
        assert_eq!(words[1].end, 2.9);
        // Segment bounds recomputed from the refined words.
        assert_eq!(out[0].start, 1.0);
        assert_eq!(out[0].end, 2.9);
    }

    #[test]
    fn disabled_stage_is_skipped() {
        let stage = RefinerStage::new(RefineConfig {
            enabled: false,
            ..RefineConfig::default()
        });
        let segments = vec![Segment::new("hi", 0.0, 1.0)];
        let outcome = stage.apply(segments.clone(), &ctx(&[])).unwrap();
        assert_eq!(outcome, StageOutcome::Skipped(segments));
    }

    #[test]
    fn unavailable_signal_degrades_to_identity() {
        let segments = vec![Segment::new("hi", 0.0, 1.0)];
        let context = StageContext {
            audio_duration: None,
            voice: VoiceSignal::Unavailable { reason: "no audio" },
        };
        match stage().apply(segments.clone(), &context).unwrap() {
            StageOutcome::Degraded { segments: out, .. } => assert_eq!(out, segments),
            other => panic!("expected Degraded, got {other:?}"),
        }
    }

    #[test]
    fn nearest_edge_prefers_earlier_on_tie() {
        let edges = [1.0, 3.0];
        assert_eq!(nearest_edge(&edges, 2.0, 1.5), Some(1.0));
    }

    #[test]
    fn refinement_is_idempotent() {
        let intervals = [SpeechInterval::new(1.0, 3.0)];
        let segments = vec![Segment::new("hello", 0.8, 3.2)];
        let once = stage()
            .apply(segments, &ctx(&intervals))
            .unwrap()
            .into_segments();
        let twice = stage()
            .apply(once.clone(), &ctx(&intervals))
            .unwrap()
            .into_segments();
        assert_eq!(once, twice);
    }
}
