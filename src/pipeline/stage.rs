//! Core stage abstraction for the enhancement pipeline.
//!
//! Each stage is a pure transform over a segment sequence plus read-only
//! access to the shared invocation context. Expected fallback paths are
//! modeled as the `Degraded` outcome, not as errors; an `Err` from a stage is
//! fatal to the invocation (the caller falls back to un-enhanced input).

use crate::error::Result;
use crate::segment::{Segment, SpeechInterval};

/// Read-only per-invocation context shared by all stages.
pub struct StageContext<'a> {
    /// Total audio duration in seconds, when known.
    pub audio_duration: Option<f64>,
    /// The voice-activity signal resolved once for this invocation.
    pub voice: VoiceSignal<'a>,
}

/// The voice-activity signal as seen by stages.
#[derive(Debug, Clone, Copy)]
pub enum VoiceSignal<'a> {
    /// Detection ran; raw (unmerged) intervals ordered by start time.
    Available {
        engine: &'a str,
        intervals: &'a [SpeechInterval],
    },
    /// Detection could not run; stages that need it degrade to identity.
    Unavailable { reason: &'a str },
    /// No stage in this pipeline asked for voice activity.
    NotRequested,
}

impl<'a> VoiceSignal<'a> {
    /// Returns the intervals, or the reason they are unavailable.
    pub fn intervals(&self) -> std::result::Result<&'a [SpeechInterval], &'a str> {
        match self {
            VoiceSignal::Available { intervals, .. } => Ok(intervals),
            VoiceSignal::Unavailable { reason } => Err(reason),
            VoiceSignal::NotRequested => Err("voice activity was not resolved"),
        }
    }
}

/// What a stage did with the sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// The stage ran and produced this sequence.
    Applied(Vec<Segment>),
    /// The stage is disabled by configuration; input passed through.
    Skipped(Vec<Segment>),
    /// The stage could not do its work and passed input through.
    Degraded {
        segments: Vec<Segment>,
        reason: String,
    },
}

impl StageOutcome {
    pub fn segments(&self) -> &[Segment] {
        match self {
            StageOutcome::Applied(segments) | StageOutcome::Skipped(segments) => segments,
            StageOutcome::Degraded { segments, .. } => segments,
        }
    }

    pub fn into_segments(self) -> Vec<Segment> {
        match self {
            StageOutcome::Applied(segments) | StageOutcome::Skipped(segments) => segments,
            StageOutcome::Degraded { segments, .. } => segments,
        }
    }
}

/// A processing stage in the enhancement pipeline.
pub trait Stage: Send {
    /// Returns the name of this stage for logging and reporting.
    fn name(&self) -> &'static str;

    /// Transforms a segment sequence.
    ///
    /// Returns:
    /// - `Ok(StageOutcome::Applied)` — processed output
    /// - `Ok(StageOutcome::Skipped)` — stage disabled, input unchanged
    /// - `Ok(StageOutcome::Degraded)` — fallback path taken, input unchanged
    /// - `Err(_)` — fatal; aborts the invocation
    fn apply(&self, segments: Vec<Segment>, ctx: &StageContext<'_>) -> Result<StageOutcome>;
}
