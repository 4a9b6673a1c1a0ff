//! Default configuration constants for voxcue.
//!
//! This module provides the built-in hard defaults — the first of the three
//! configuration layers. The process-wide config file and per-invocation
//! overrides both resolve against these values.

/// Default stage order for the enhancement pipeline.
///
/// Silence filtering runs first so later stages only see speech, boundary
/// refinement runs on the surviving segments, and splitting runs last so cue
/// limits apply to the final time ranges.
pub const PIPELINE: &str = "vad,refine,split";

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard rate for speech models; WAV input at other rates is
/// resampled to this before voice-activity detection.
pub const SAMPLE_RATE: u32 = 16_000;

/// Default Silero speech-probability threshold (0.0 to 1.0).
///
/// Frames scoring at or above this probability count as speech. 0.5 is the
/// Silero authors' recommended operating point.
pub const SILERO_THRESHOLD: f32 = 0.5;

/// Default minimum silence duration (ms) before Silero closes a speech interval.
pub const SILERO_MIN_SILENCE_MS: u32 = 500;

/// Default WebRTC VAD aggressiveness (0 = most permissive, 3 = most aggressive).
pub const WEBRTC_AGGRESSIVENESS: u8 = 2;

/// Default minimum speech run (ms) for the WebRTC engine.
///
/// Speech bursts shorter than this are treated as noise and discarded.
pub const WEBRTC_MIN_SPEECH_MS: u32 = 250;

/// Default maximum in-speech silence (ms) for the WebRTC engine.
///
/// Silence runs longer than this close the current speech interval.
pub const WEBRTC_MAX_SILENCE_MS: u32 = 300;

/// Default minimum silence duration in seconds for segment-level decisions.
///
/// Speech intervals separated by a shorter gap are merged: brief pauses
/// within an utterance are part of continuous speech, not segment-worthy
/// silence.
pub const MIN_SILENCE_DURATION_SECS: f64 = 1.0;

/// Default boundary search window (ms) for timestamp refinement.
///
/// ASR models routinely drift a few hundred milliseconds at segment edges;
/// the refiner looks this far on either side of each boundary for a detected
/// speech edge to snap to.
pub const SEARCH_WINDOW_MS: u32 = 300;

/// Default maximum segment duration in seconds before splitting.
///
/// Matches common subtitle-cue guidance: beyond ~7 seconds a single cue
/// overstays its welcome on screen.
pub const MAX_SEGMENT_DURATION_SECS: f64 = 7.0;

/// Default maximum characters per segment before splitting.
///
/// Two full 42-character subtitle lines.
pub const MAX_SEGMENT_CHARS: usize = 84;

/// Default estimated seconds of speech per character.
///
/// Used only to estimate where a duration limit would trip inside a segment
/// when no word-level timing is available; measured durations always win.
pub const CHAR_DURATION_SECS: f64 = 0.4;

/// Hard cap on split recursion depth.
///
/// Guarantees termination on pathological input (a single enormous token);
/// at this depth a sub-segment may exceed the character limit rather than
/// loop.
pub const MAX_SPLIT_DEPTH: u32 = 8;

/// Absolute tolerance (seconds) for duration-conservation checks.
pub const DURATION_TOLERANCE_SECS: f64 = 1e-6;
