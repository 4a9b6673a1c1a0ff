//! Error types for voxcue.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnhanceError {
    // Configuration errors — rejected before a job runs, never silently corrected
    #[error("Unrecognized configuration option: {key}")]
    ConfigUnknownOption { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Unknown pipeline stage: {name}")]
    UnknownStage { name: String },

    #[error("Duplicate pipeline stage: {name}")]
    DuplicateStage { name: String },

    #[error("Enhancement is enabled but the pipeline stage list is empty")]
    EmptyPipeline,

    // Fatal pipeline errors — the invocation aborts, the job keeps its un-enhanced input
    #[error("{stage} stage violated an output invariant: {message}")]
    InvariantViolation {
        stage: &'static str,
        message: String,
    },

    // Input handling
    #[error("Malformed transcript: {message}")]
    MalformedTranscript { message: String },

    #[error("Failed to decode audio: {message}")]
    AudioDecode { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnhanceError {
    /// True for errors a caller should see as a rejected request (bad
    /// configuration) rather than a processing failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EnhanceError::ConfigUnknownOption { .. }
                | EnhanceError::ConfigInvalidValue { .. }
                | EnhanceError::ConfigParse { .. }
                | EnhanceError::UnknownStage { .. }
                | EnhanceError::DuplicateStage { .. }
                | EnhanceError::EmptyPipeline
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, EnhanceError>;
