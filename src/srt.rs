//! SRT subtitle rendering.
//!
//! Converts an enhanced segment sequence into SubRip format: a 1-based cue
//! index, `HH:MM:SS,mmm --> HH:MM:SS,mmm` time line, and the cue text.

use crate::segment::Segment;
use std::fmt::Write;

/// Renders segments as the contents of an `.srt` file.
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (segment, index) in segments.iter().zip(1..) {
        if index > 1 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{index}\n{} --> {}\n{}",
            timestamp(segment.start),
            timestamp(segment.end),
            segment.text.trim()
        );
    }
    out
}

/// Formats seconds as an SRT timestamp (`HH:MM:SS,mmm`).
fn timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_timestamps() {
        assert_eq!(timestamp(0.0), "00:00:00,000");
        assert_eq!(timestamp(1.5), "00:00:01,500");
        assert_eq!(timestamp(61.25), "00:01:01,250");
        assert_eq!(timestamp(3661.007), "01:01:01,007");
    }

    #[test]
    fn renders_numbered_cues() {
        let segments = vec![
            Segment::new("Hello world.", 0.0, 1.1),
            Segment::new("How are you?", 1.5, 3.1),
        ];
        let srt = render(&segments);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,100\nHello world.\n\n2\n00:00:01,500 --> 00:00:03,100\nHow are you?\n"
        );
    }

    #[test]
    fn empty_sequence_renders_empty() {
        assert_eq!(render(&[]), "");
    }
}
