//! Command-line interface for voxcue
//!
//! Provides argument parsing using clap derive macros.

use crate::resolve::EnhanceOverrides;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ASR transcript enhancement
#[derive(Parser, Debug)]
#[command(name = "voxcue", version, about = "ASR transcript enhancement")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress log output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: stage decisions, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enhance an ASR result: filter silence, refine boundaries, split cues
    Enhance {
        /// ASR result JSON file (- for stdin)
        #[arg(long, short = 'i', value_name = "PATH")]
        input: PathBuf,

        /// Source audio WAV file, enables voice-activity stages
        #[arg(long, short = 'a', value_name = "PATH")]
        audio: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Per-invocation overrides as a JSON object, same schema as the API
        #[arg(long, value_name = "JSON")]
        overrides: Option<String>,

        /// Stage list override, e.g. "vad,split"
        #[arg(long, value_name = "STAGES")]
        pipeline: Option<String>,

        /// Voice-activity engine override (auto, silero, webrtc)
        #[arg(long, value_name = "ENGINE")]
        engine: Option<String>,

        /// Maximum characters per cue
        #[arg(long, value_name = "CHARS")]
        max_chars: Option<usize>,

        /// Maximum cue duration. Examples: 7s, 6500ms
        #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
        max_duration: Option<f64>,

        /// Minimum silence treated as a segment break. Examples: 1s, 800ms
        #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
        min_silence: Option<f64>,
    },

    /// Validate a configuration file and print the resolved values
    ConfigCheck {
        /// Configuration file to check (defaults to the standard path)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Srt,
}

/// Parse a duration string into fractional seconds.
///
/// Supports any format accepted by `humantime`: bare numbers are rejected,
/// use explicit units (`7s`, `6500ms`, `1m30s`).
fn parse_secs(s: &str) -> Result<f64, String> {
    humantime::parse_duration(s)
        .map(|d| d.as_secs_f64())
        .map_err(|e| format!("invalid duration '{s}': {e}"))
}

/// Assembles the override structure from individual flags plus an optional
/// raw JSON payload. Flags win over the payload, mirroring how a caller's
/// explicit choice beats its own defaults.
pub fn build_overrides(
    overrides_json: Option<&str>,
    pipeline: Option<String>,
    engine: Option<&str>,
    max_chars: Option<usize>,
    max_duration: Option<f64>,
    min_silence: Option<f64>,
) -> crate::error::Result<Option<EnhanceOverrides>> {
    let mut overrides = match overrides_json {
        Some(json) => EnhanceOverrides::from_json(json)?,
        None => EnhanceOverrides::default(),
    };

    if pipeline.is_some() {
        overrides.pipeline = pipeline;
    }
    if let Some(engine) = engine {
        let value = serde_json::json!({ "vad": { "engine": engine } });
        let parsed = EnhanceOverrides::from_value(&value)?;
        overrides.vad.engine = parsed.vad.engine;
    }
    if max_chars.is_some() {
        overrides.split.max_chars = max_chars;
    }
    if max_duration.is_some() {
        overrides.split.max_duration = max_duration;
    }
    if min_silence.is_some() {
        overrides.vad.min_silence_duration = min_silence;
    }

    if overrides == EnhanceOverrides::default() {
        Ok(None)
    } else {
        Ok(Some(overrides))
    }
}
