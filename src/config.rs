//! Process-wide configuration for the enhancement pipeline.
//!
//! This is the middle of the three configuration layers: built-in defaults
//! (`defaults` module) → this process config, read once at startup and
//! immutable thereafter → per-invocation overrides (`resolve` module).

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Master switch: when false the pipeline is an identity transform.
    pub enabled: bool,
    /// Comma-separated stage list, e.g. "vad,refine,split".
    pub pipeline: String,
    /// Attach an enhancement report to serialized output.
    pub include_enhanced_metadata: bool,
    pub vad: VadConfig,
    pub refine: RefineConfig,
    pub split: SplitConfig,
}

/// Voice-activity filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VadConfig {
    pub enabled: bool,
    pub engine: VadEngineKind,
    /// Silero speech-probability threshold (0.0 to 1.0).
    pub silero_threshold: f32,
    /// Minimum silence (ms) before Silero closes a speech interval.
    pub silero_min_silence_ms: u32,
    /// WebRTC aggressiveness mode (0 to 3).
    pub webrtc_aggressiveness: u8,
    /// Minimum speech run (ms) the WebRTC engine keeps.
    pub webrtc_min_speech_ms: u32,
    /// Maximum in-speech silence (ms) before WebRTC closes an interval.
    pub webrtc_max_silence_ms: u32,
    /// Minimum silence (seconds) treated as segment-worthy; shorter gaps are
    /// merged into continuous speech.
    pub min_silence_duration: f64,
}

/// Boundary refinement configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefineConfig {
    pub enabled: bool,
    /// Search window (ms) on either side of a boundary.
    pub search_window_ms: u32,
}

/// Long-segment splitting configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SplitConfig {
    pub enabled: bool,
    /// Maximum segment duration in seconds.
    pub max_duration: f64,
    /// Maximum characters per segment.
    pub max_chars: usize,
    /// Estimated seconds per character, for duration estimates without
    /// word-level timing.
    pub char_duration_sec: f64,
}

/// Voice-activity engine selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VadEngineKind {
    /// Probe engines in fixed priority order: silero, then webrtc.
    #[default]
    Auto,
    Silero,
    Webrtc,
}

impl VadEngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VadEngineKind::Auto => "auto",
            VadEngineKind::Silero => "silero",
            VadEngineKind::Webrtc => "webrtc",
        }
    }
}

impl fmt::Display for VadEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: VadEngineKind::Auto,
            silero_threshold: defaults::SILERO_THRESHOLD,
            silero_min_silence_ms: defaults::SILERO_MIN_SILENCE_MS,
            webrtc_aggressiveness: defaults::WEBRTC_AGGRESSIVENESS,
            webrtc_min_speech_ms: defaults::WEBRTC_MIN_SPEECH_MS,
            webrtc_max_silence_ms: defaults::WEBRTC_MAX_SILENCE_MS,
            min_silence_duration: defaults::MIN_SILENCE_DURATION_SECS,
        }
    }
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_window_ms: defaults::SEARCH_WINDOW_MS,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_duration: defaults::MAX_SEGMENT_DURATION_SECS,
            max_chars: defaults::MAX_SEGMENT_CHARS,
            char_duration_sec: defaults::CHAR_DURATION_SECS,
        }
    }
}

impl Default for Config {
    /// The built-in hard defaults: enhancement on, full stage order.
    fn default() -> Self {
        Self {
            enabled: true,
            pipeline: defaults::PIPELINE.to_string(),
            include_enhanced_metadata: false,
            vad: VadConfig::default(),
            refine: RefineConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return the built-in defaults if the
    /// file doesn't exist.
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXCUE_ENABLED → enabled ("1"/"true"/"0"/"false")
    /// - VOXCUE_PIPELINE → pipeline
    /// - VOXCUE_VAD_ENGINE → vad.engine (auto|silero|webrtc)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(enabled) = std::env::var("VOXCUE_ENABLED") {
            match enabled.trim() {
                "1" | "true" => self.enabled = true,
                "0" | "false" => self.enabled = false,
                _ => {}
            }
        }

        if let Ok(pipeline) = std::env::var("VOXCUE_PIPELINE") {
            if !pipeline.is_empty() {
                self.pipeline = pipeline;
            }
        }

        if let Ok(engine) = std::env::var("VOXCUE_VAD_ENGINE") {
            match engine.trim() {
                "auto" => self.vad.engine = VadEngineKind::Auto,
                "silero" => self.vad.engine = VadEngineKind::Silero,
                "webrtc" => self.vad.engine = VadEngineKind::Webrtc,
                _ => {}
            }
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxcue/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> std::path::PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("voxcue")
            .join("config.toml")
    }
}
