//! ASR result ingestion.
//!
//! The input contract from the ASR collaborator: an ordered segment sequence
//! (optionally with word-level timing), the audio duration, and an optional
//! language tag. Ordering is validated on ingest so pipeline stages can rely
//! on it.

use crate::error::{EnhanceError, Result};
use crate::pipeline::report::EnhanceReport;
use crate::segment::{self, Segment};
use serde::{Deserialize, Serialize};

/// A raw ASR result, as handed to the enhancement pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    /// Total audio duration in seconds.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Parses and validates a transcript from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let transcript: Transcript =
            serde_json::from_str(json).map_err(|e| EnhanceError::MalformedTranscript {
                message: e.to_string(),
            })?;
        transcript.validate()?;
        Ok(transcript)
    }

    /// Checks the input contract: finite duration, ordered non-overlapping
    /// segments.
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(EnhanceError::MalformedTranscript {
                message: format!("duration must be non-negative, got {}", self.duration),
            });
        }
        segment::verify_sequence(&self.segments)
            .map_err(|message| EnhanceError::MalformedTranscript { message })
    }
}

/// An enhanced transcript: the same shape as the input, optionally annotated
/// with a report of what the pipeline did.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnhancedTranscript {
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub segments: Vec<Segment>,
    /// Present only when `include_enhanced_metadata` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhancement: Option<EnhanceReport>,
}

impl EnhancedTranscript {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EnhanceError::MalformedTranscript {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_transcript() {
        let transcript = Transcript::from_json(
            r#"{
                "duration": 3.5,
                "segments": [
                    { "start": 0.0, "end": 1.5, "text": "hello" },
                    { "start": 1.5, "end": 3.0, "text": "world" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.language, None);
        assert_eq!(transcript.segments[1].text, "world");
    }

    #[test]
    fn parses_word_level_timing() {
        let transcript = Transcript::from_json(
            r#"{
                "duration": 2.0,
                "language": "en",
                "segments": [
                    {
                        "start": 0.0, "end": 2.0, "text": "hi there",
                        "words": [
                            { "start": 0.1, "end": 0.8, "text": "hi" },
                            { "start": 1.0, "end": 1.9, "text": "there" }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        let words = transcript.segments[0].words.as_ref().unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text, "there");
    }

    #[test]
    fn rejects_overlapping_input() {
        let err = Transcript::from_json(
            r#"{
                "duration": 3.0,
                "segments": [
                    { "start": 0.0, "end": 2.0, "text": "a" },
                    { "start": 1.0, "end": 3.0, "text": "b" }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, EnhanceError::MalformedTranscript { .. }));
    }

    #[test]
    fn rejects_garbage_json() {
        assert!(Transcript::from_json("not json").is_err());
    }

    #[test]
    fn enhanced_output_omits_absent_metadata() {
        let enhanced = EnhancedTranscript {
            duration: 1.0,
            language: None,
            segments: vec![Segment::new("hi", 0.0, 1.0)],
            enhancement: None,
        };
        let json = enhanced.to_json().unwrap();
        assert!(!json.contains("enhancement"));
        assert!(!json.contains("language"));
        assert!(!json.contains("words"));
    }
}
