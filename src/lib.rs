//! voxcue - ASR transcript enhancement
//!
//! Post-processes speech-recognition output: trims and drops segments against
//! detected silence, snaps timestamps onto voice-activity edges, and splits
//! over-long segments into subtitle-friendly cues. Runs once per transcription
//! job, after the full ASR result is available; it reshapes timing and
//! segmentation, never text content.

// Enforce error handling discipline: library code propagates, never panics
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod resolve;
pub mod segment;
pub mod srt;
pub mod transcript;
pub mod vad;

// Core data model
pub use segment::{Segment, SpeechInterval, Word};
pub use transcript::{EnhancedTranscript, Transcript};

// Configuration layers
pub use config::{Config, RefineConfig, SplitConfig, VadConfig, VadEngineKind};
pub use resolve::{EnhanceOverrides, ResolvedConfig};

// Pipeline
pub use pipeline::{build, EnhanceOutcome, EnhanceReport, Pipeline, PipelineSpec, StageKind};

// Error handling
pub use error::{EnhanceError, Result};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
