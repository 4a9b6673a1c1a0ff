//! Audio handling for voice-activity detection.
//!
//! The pipeline needs raw audio only as the input to the VAD engines. Audio
//! is decoded once per job into an [`AudioContext`] — 16 kHz mono PCM — and
//! shared read-only across stages.

pub mod wav;

/// Decoded audio for one transcription job.
#[derive(Debug, Clone)]
pub struct AudioContext {
    /// PCM samples (16-bit signed integers), mono.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioContext {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_sample_count() {
        let audio = AudioContext::new(vec![0; 32_000], 16_000);
        assert!((audio.duration() - 2.0).abs() < 1e-9);
    }
}
