//! Silero ONNX voice-activity engine.
//!
//! Runs the Silero model over fixed 512-sample windows and converts the
//! per-window speech probabilities into intervals using the shared debounce
//! logic.

use super::{IntervalBuilder, SpeechDetector};
use crate::config::VadConfig;
use crate::segment::SpeechInterval;
use voice_activity_detector::VoiceActivityDetector;

/// Window size required by the Silero model at 16 kHz.
const WINDOW_SAMPLES: usize = 512;
const REQUIRED_SAMPLE_RATE: u32 = 16_000;

pub struct SileroDetector {
    detector: VoiceActivityDetector,
    threshold: f32,
    min_silence_ms: u32,
}

impl std::fmt::Debug for SileroDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SileroDetector")
            .field("threshold", &self.threshold)
            .field("min_silence_ms", &self.min_silence_ms)
            .finish_non_exhaustive()
    }
}

impl SileroDetector {
    pub fn new(config: &VadConfig) -> Result<Self, String> {
        let detector = VoiceActivityDetector::builder()
            .sample_rate(16_000)
            .chunk_size(512_usize)
            .build()
            .map_err(|e| format!("failed to create Silero VAD: {e}"))?;

        Ok(Self {
            detector,
            threshold: config.silero_threshold,
            min_silence_ms: config.silero_min_silence_ms,
        })
    }
}

impl SpeechDetector for SileroDetector {
    fn name(&self) -> &'static str {
        "silero"
    }

    fn detect(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<Vec<SpeechInterval>, String> {
        if sample_rate != REQUIRED_SAMPLE_RATE {
            return Err(format!(
                "silero requires {REQUIRED_SAMPLE_RATE} Hz audio, got {sample_rate} Hz"
            ));
        }

        let frame_duration = WINDOW_SAMPLES as f64 / f64::from(sample_rate);
        let mut builder = IntervalBuilder::new(frame_duration, 0, self.min_silence_ms);

        for window in samples.chunks(WINDOW_SAMPLES) {
            // The final short window is zero-padded to the model's size.
            let probability = if window.len() == WINDOW_SAMPLES {
                self.detector.predict(window.iter().copied())
            } else {
                let mut padded = window.to_vec();
                padded.resize(WINDOW_SAMPLES, 0);
                self.detector.predict(padded)
            };
            builder.push(probability >= self.threshold);
        }

        Ok(builder.finish())
    }
}
