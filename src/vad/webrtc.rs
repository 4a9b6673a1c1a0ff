//! WebRTC voice-activity engine.
//!
//! Classifies 30 ms frames with the WebRTC VAD and converts the boolean
//! decisions into intervals using the shared debounce logic. The underlying
//! detector wraps a raw C handle and is not `Send`, so a fresh instance is
//! created per detect call; construction is cheap.

use super::{IntervalBuilder, SpeechDetector};
use crate::config::VadConfig;
use crate::segment::SpeechInterval;
use webrtc_vad::{SampleRate, Vad, VadMode};

/// 30 ms frames, the largest size the WebRTC VAD accepts.
const FRAME_MS: usize = 30;

#[derive(Debug)]
pub struct WebRtcDetector {
    aggressiveness: u8,
    min_speech_ms: u32,
    max_silence_ms: u32,
}

impl WebRtcDetector {
    pub fn new(config: &VadConfig) -> Result<Self, String> {
        if config.webrtc_aggressiveness > 3 {
            return Err(format!(
                "aggressiveness {} out of range 0..=3",
                config.webrtc_aggressiveness
            ));
        }
        Ok(Self {
            aggressiveness: config.webrtc_aggressiveness,
            min_speech_ms: config.webrtc_min_speech_ms,
            max_silence_ms: config.webrtc_max_silence_ms,
        })
    }

    fn mode(&self) -> VadMode {
        match self.aggressiveness {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            _ => VadMode::VeryAggressive,
        }
    }
}

impl SpeechDetector for WebRtcDetector {
    fn name(&self) -> &'static str {
        "webrtc"
    }

    fn detect(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<Vec<SpeechInterval>, String> {
        let rate = match sample_rate {
            8_000 => SampleRate::Rate8kHz,
            16_000 => SampleRate::Rate16kHz,
            32_000 => SampleRate::Rate32kHz,
            48_000 => SampleRate::Rate48kHz,
            other => return Err(format!("webrtc does not support {other} Hz audio")),
        };
        let mut vad = Vad::new_with_rate_and_mode(rate, self.mode());

        let frame_samples = sample_rate as usize * FRAME_MS / 1000;
        let frame_duration = FRAME_MS as f64 / 1000.0;
        let mut builder =
            IntervalBuilder::new(frame_duration, self.min_speech_ms, self.max_silence_ms);

        // The trailing partial frame is dropped; it is under 30 ms of audio.
        for frame in samples.chunks_exact(frame_samples) {
            let is_speech = vad
                .is_voice_segment(frame)
                .map_err(|_| "webrtc rejected an audio frame".to_string())?;
            builder.push(is_speech);
        }

        Ok(builder.finish())
    }
}
