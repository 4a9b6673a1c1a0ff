//! Voice-activity signal extraction.
//!
//! Wraps the available VAD engines behind one [`SpeechDetector`] trait and
//! turns per-frame speech decisions into ordered, non-overlapping
//! [`SpeechInterval`]s. Engines are compile-time optional; `auto` probes them
//! in a fixed priority order at invocation time and the chosen engine is
//! recorded in the enhancement report.

pub mod mock;
#[cfg(feature = "silero")]
pub mod silero;
#[cfg(feature = "webrtc")]
pub mod webrtc;

use crate::config::{VadConfig, VadEngineKind};
use crate::segment::SpeechInterval;
use tracing::debug;

/// A voice-activity engine: classifies raw audio into speech intervals.
///
/// Implementations must return intervals ordered by start time and
/// non-overlapping. Errors are reported as strings; the pipeline treats them
/// as a degradation, never a job failure.
pub trait SpeechDetector: Send + std::fmt::Debug {
    /// Engine name for logs and the enhancement report.
    fn name(&self) -> &'static str;

    /// Detects speech intervals over the full audio.
    fn detect(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<Vec<SpeechInterval>, String>;
}

/// Resolves the configured engine to a concrete detector.
///
/// `auto` probes in fixed priority order — silero, then webrtc — so behavior
/// is deterministic and reproducible given the same build features. The error
/// names every engine that was tried.
pub fn resolve_detector(config: &VadConfig) -> Result<Box<dyn SpeechDetector>, String> {
    match config.engine {
        VadEngineKind::Silero => silero_detector(config),
        VadEngineKind::Webrtc => webrtc_detector(config),
        VadEngineKind::Auto => match silero_detector(config) {
            Ok(detector) => Ok(detector),
            Err(silero_err) => {
                debug!("silero unavailable ({silero_err}), probing webrtc");
                webrtc_detector(config).map_err(|webrtc_err| {
                    format!("no VAD engine available (silero: {silero_err}; webrtc: {webrtc_err})")
                })
            }
        },
    }
}

#[cfg(feature = "silero")]
fn silero_detector(config: &VadConfig) -> Result<Box<dyn SpeechDetector>, String> {
    silero::SileroDetector::new(config).map(|d| Box::new(d) as Box<dyn SpeechDetector>)
}

#[cfg(not(feature = "silero"))]
fn silero_detector(_config: &VadConfig) -> Result<Box<dyn SpeechDetector>, String> {
    Err("built without the `silero` feature".to_string())
}

#[cfg(feature = "webrtc")]
fn webrtc_detector(config: &VadConfig) -> Result<Box<dyn SpeechDetector>, String> {
    webrtc::WebRtcDetector::new(config).map(|d| Box::new(d) as Box<dyn SpeechDetector>)
}

#[cfg(not(feature = "webrtc"))]
fn webrtc_detector(_config: &VadConfig) -> Result<Box<dyn SpeechDetector>, String> {
    Err("built without the `webrtc` feature".to_string())
}

/// Merges adjacent intervals separated by a silence gap shorter than
/// `min_silence` seconds.
///
/// Brief pauses within an utterance are part of continuous speech, not
/// segment-worthy silence.
pub fn merge_intervals(intervals: &[SpeechInterval], min_silence: f64) -> Vec<SpeechInterval> {
    let mut merged: Vec<SpeechInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start - last.end < min_silence => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(*interval),
        }
    }
    merged
}

/// Builds speech intervals from fixed-size frame classifications.
///
/// Shared debounce logic for the frame-oriented engines: a speech run shorter
/// than `min_speech_ms` is discarded as noise; a silence run shorter than
/// `min_silence_ms` does not close the current interval.
pub(crate) struct IntervalBuilder {
    frame_duration: f64,
    min_speech: f64,
    min_silence: f64,
    intervals: Vec<SpeechInterval>,
    state: BuilderState,
    clock: f64,
}

enum BuilderState {
    Silence,
    /// Accumulating speech; `silence_start` set while inside a tentative gap.
    Speech {
        start: f64,
        silence_start: Option<f64>,
    },
}

impl IntervalBuilder {
    pub(crate) fn new(frame_duration: f64, min_speech_ms: u32, min_silence_ms: u32) -> Self {
        Self {
            frame_duration,
            min_speech: f64::from(min_speech_ms) / 1000.0,
            min_silence: f64::from(min_silence_ms) / 1000.0,
            intervals: Vec::new(),
            state: BuilderState::Silence,
            clock: 0.0,
        }
    }

    /// Feeds one frame's classification.
    pub(crate) fn push(&mut self, is_speech: bool) {
        let now = self.clock;
        self.clock += self.frame_duration;

        match &mut self.state {
            BuilderState::Silence => {
                if is_speech {
                    self.state = BuilderState::Speech {
                        start: now,
                        silence_start: None,
                    };
                }
            }
            BuilderState::Speech {
                start,
                silence_start,
            } => {
                if is_speech {
                    *silence_start = None;
                } else {
                    let silence_from = silence_start.get_or_insert(now);
                    if self.clock - *silence_from >= self.min_silence {
                        let interval = SpeechInterval::new(*start, *silence_from);
                        self.state = BuilderState::Silence;
                        self.commit(interval);
                    }
                }
            }
        }
    }

    /// Closes any open interval and returns the collected sequence.
    pub(crate) fn finish(mut self) -> Vec<SpeechInterval> {
        if let BuilderState::Speech {
            start,
            silence_start,
        } = self.state
        {
            let end = silence_start.unwrap_or(self.clock);
            self.state = BuilderState::Silence;
            self.commit(SpeechInterval::new(start, end));
        }
        self.intervals
    }

    fn commit(&mut self, interval: SpeechInterval) {
        if interval.duration() >= self.min_speech && interval.duration() > 0.0 {
            self.intervals.push(interval);
        }
    }
}
