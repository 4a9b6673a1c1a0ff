//! Enhancement report: what the pipeline actually did.
//!
//! Attached to serialized output when `include_enhanced_metadata` is set, so
//! downstream consumers can tell which stages ran, which engine `auto`
//! resolved to, and why a stage fell back.

use serde::Serialize;

/// Per-invocation record of pipeline activity.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct EnhanceReport {
    /// False when the whole subsystem was disabled (identity transform).
    pub enabled: bool,
    /// Engine the voice-activity signal resolved to, when one was needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vad_engine: Option<String>,
    pub stages: Vec<StageRun>,
}

/// One stage's disposition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageRun {
    pub stage: String,
    pub status: StageStatus,
    /// Degradation reason, when status is `degraded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Applied,
    Skipped,
    Degraded,
}

impl EnhanceReport {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            vad_engine: None,
            stages: Vec::new(),
        }
    }

    pub fn record(&mut self, stage: &str, status: StageStatus, detail: Option<String>) {
        self.stages.push(StageRun {
            stage: stage.to_string(),
            status,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_compactly() {
        let mut report = EnhanceReport {
            enabled: true,
            vad_engine: Some("silero".to_string()),
            stages: Vec::new(),
        };
        report.record("vad", StageStatus::Applied, None);
        report.record("split", StageStatus::Degraded, Some("oops".to_string()));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["vad_engine"], "silero");
        assert_eq!(json["stages"][0]["status"], "applied");
        assert!(json["stages"][0].get("detail").is_none());
        assert_eq!(json["stages"][1]["detail"], "oops");
    }

    #[test]
    fn disabled_report_has_no_engine() {
        let report = EnhanceReport::disabled();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["enabled"], false);
        assert!(json.get("vad_engine").is_none());
    }
}
