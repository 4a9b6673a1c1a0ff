//! WAV file decoding for voice-activity detection.
//!
//! Supports arbitrary sample rates and channel counts, downmixing to mono
//! and resampling to 16kHz.

use crate::audio::AudioContext;
use crate::defaults::SAMPLE_RATE;
use crate::error::{EnhanceError, Result};
use std::io::Read;
use std::path::Path;

/// Reads WAV data into an [`AudioContext`] at 16kHz mono.
pub fn read_wav(reader: impl Read) -> Result<AudioContext> {
    let mut wav_reader = hound::WavReader::new(reader).map_err(|e| EnhanceError::AudioDecode {
        message: format!("failed to parse WAV data: {e}"),
    })?;

    let spec = wav_reader.spec();
    let source_rate = spec.sample_rate;
    let source_channels = spec.channels;

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(EnhanceError::AudioDecode {
            message: format!(
                "unsupported WAV format: {:?} at {} bits (need 16-bit PCM)",
                spec.sample_format, spec.bits_per_sample
            ),
        });
    }

    let raw_samples: Vec<i16> = wav_reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| EnhanceError::AudioDecode {
            message: format!("failed to read WAV samples: {e}"),
        })?;

    // Downmix to mono by averaging channels
    let mono_samples = if source_channels > 1 {
        raw_samples
            .chunks_exact(source_channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / i32::from(source_channels)) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    let samples = if source_rate != SAMPLE_RATE {
        resample(&mono_samples, source_rate, SAMPLE_RATE)
    } else {
        mono_samples
    };

    Ok(AudioContext::new(samples, SAMPLE_RATE))
}

/// Reads a WAV file from disk.
pub fn read_wav_file(path: &Path) -> Result<AudioContext> {
    let file = std::fs::File::open(path)?;
    read_wav(std::io::BufReader::new(file))
}

/// Linear interpolation resampling. Adequate for VAD, which only needs
/// energy envelopes, not transparent audio quality.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx.min(samples.len().saturating_sub(1))]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn reads_mono_16khz_unchanged() {
        let samples = vec![100i16, -100, 200, -200];
        let data = make_wav_data(16_000, 1, &samples);
        let audio = read_wav(Cursor::new(data)).unwrap();
        assert_eq!(audio.samples, samples);
        assert_eq!(audio.sample_rate, 16_000);
    }

    #[test]
    fn downmixes_stereo_to_mono() {
        // Interleaved L/R pairs average per frame
        let data = make_wav_data(16_000, 2, &[100, 300, -100, -300]);
        let audio = read_wav(Cursor::new(data)).unwrap();
        assert_eq!(audio.samples, vec![200, -200]);
    }

    #[test]
    fn resamples_to_16khz() {
        let samples = vec![0i16; 8_000];
        let data = make_wav_data(8_000, 1, &samples);
        let audio = read_wav(Cursor::new(data)).unwrap();
        assert_eq!(audio.sample_rate, 16_000);
        assert_eq!(audio.samples.len(), 16_000);
    }

    #[test]
    fn resample_interpolates_between_samples() {
        let samples = vec![0i16, 1000, 2000];
        let resampled = resample(&samples, 8_000, 16_000);
        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0);
        assert!(resampled[1] > 0 && resampled[1] < 1000);
    }

    #[test]
    fn rejects_garbage_data() {
        let err = read_wav(Cursor::new(vec![1u8, 2, 3, 4])).unwrap_err();
        assert!(matches!(err, EnhanceError::AudioDecode { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_wav_file(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(matches!(err, EnhanceError::Io(_)));
    }
}
