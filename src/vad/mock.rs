//! Scripted detector for testing.

use super::SpeechDetector;
use crate::segment::SpeechInterval;

/// Mock detector that returns a fixed interval script (or a fixed failure),
/// so stage behavior can be tested without any engine feature enabled.
#[derive(Debug, Clone, Default)]
pub struct MockDetector {
    intervals: Vec<SpeechInterval>,
    should_fail: bool,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the intervals the mock will report.
    pub fn with_intervals(mut self, intervals: Vec<SpeechInterval>) -> Self {
        self.intervals = intervals;
        self
    }

    /// Configure the mock to fail on detect.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl SpeechDetector for MockDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn detect(
        &mut self,
        _samples: &[i16],
        _sample_rate: u32,
    ) -> Result<Vec<SpeechInterval>, String> {
        if self.should_fail {
            Err("mock detector failure".to_string())
        } else {
            Ok(self.intervals.clone())
        }
    }
}
