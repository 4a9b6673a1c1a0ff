//! Pipeline spec parsing.
//!
//! A pipeline spec is an ordered, comma-separated stage list such as
//! `"vad,refine,split"`. The stage set is closed; unknown names and
//! duplicates are rejected at resolution time rather than silently ignored.

use crate::error::{EnhanceError, Result};
use std::fmt;
use std::str::FromStr;

/// The closed set of enhancement stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Silence filtering against detected voice activity.
    Vad,
    /// Timestamp boundary refinement.
    Refine,
    /// Long-segment splitting.
    Split,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Vad => "vad",
            StageKind::Refine => "refine",
            StageKind::Split => "split",
        }
    }
}

impl FromStr for StageKind {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vad" => Ok(StageKind::Vad),
            "refine" => Ok(StageKind::Refine),
            "split" => Ok(StageKind::Split),
            other => Err(EnhanceError::UnknownStage {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered list of stage kinds, parsed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    stages: Vec<StageKind>,
}

impl PipelineSpec {
    /// Parses a comma-separated stage list.
    ///
    /// An empty or whitespace-only spec parses to an empty list; whether that
    /// is an error depends on the top-level `enabled` flag and is decided by
    /// the resolver.
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.trim().is_empty() {
            return Ok(Self { stages: Vec::new() });
        }

        let mut stages = Vec::new();
        for token in spec.split(',') {
            let token = token.trim();
            let kind: StageKind = token.parse()?;
            if stages.contains(&kind) {
                return Err(EnhanceError::DuplicateStage {
                    name: kind.as_str().to_string(),
                });
            }
            stages.push(kind);
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[StageKind] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn contains(&self, kind: StageKind) -> bool {
        self.stages.contains(&kind)
    }
}

impl fmt::Display for PipelineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(StageKind::as_str).collect();
        f.write_str(&names.join(","))
    }
}
