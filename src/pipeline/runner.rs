//! Pipeline execution.
//!
//! Stages run in the order named by the pipeline spec, each feeding its
//! output sequence to the next. The voice-activity signal is resolved once
//! per invocation, before the first stage, and shared read-only. A stage
//! degradation is recorded and execution continues; a fatal error aborts the
//! invocation and the caller falls back to the un-enhanced input.

use crate::audio::AudioContext;
use crate::error::{EnhanceError, Result};
use crate::pipeline::report::{EnhanceReport, StageRun, StageStatus};
use crate::pipeline::spec::StageKind;
use crate::pipeline::stage::{Stage, StageContext, StageOutcome, VoiceSignal};
use crate::resolve::ResolvedConfig;
use crate::segment::{self, Segment, SpeechInterval};
use crate::vad::{resolve_detector, SpeechDetector};
use tracing::{debug, warn};

/// The result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceOutcome {
    pub segments: Vec<Segment>,
    pub report: EnhanceReport,
}

/// Resolved voice activity for one invocation.
enum ResolvedVoice {
    Detected {
        engine: String,
        intervals: Vec<SpeechInterval>,
    },
    Unavailable {
        reason: String,
    },
    NotRequested,
}

/// An executable enhancement pipeline for a single configuration.
///
/// Holds no state across invocations beyond its immutable configuration;
/// concurrent jobs each build their own instance.
pub struct Pipeline {
    config: ResolvedConfig,
    stages: Vec<Box<dyn Stage>>,
    detector_override: Option<Box<dyn SpeechDetector>>,
}

impl Pipeline {
    pub(crate) fn new(config: ResolvedConfig, stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            config,
            stages,
            detector_override: None,
        }
    }

    /// Replaces engine resolution with a caller-supplied detector. Used by
    /// tests and callers with a pre-computed signal.
    pub fn with_detector(mut self, detector: Box<dyn SpeechDetector>) -> Self {
        self.detector_override = Some(detector);
        self
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs the pipeline over a segment sequence.
    ///
    /// Returns a fatal error only for malformed input or an invariant
    /// violation; expected engine failures degrade and continue.
    pub fn run(
        &mut self,
        segments: Vec<Segment>,
        audio: Option<&AudioContext>,
    ) -> Result<EnhanceOutcome> {
        if !self.config.enabled {
            debug!("enhancement disabled, passing segments through");
            return Ok(EnhanceOutcome {
                segments,
                report: EnhanceReport::disabled(),
            });
        }

        segment::verify_sequence(&segments)
            .map_err(|message| EnhanceError::MalformedTranscript { message })?;

        let voice = self.resolve_voice(audio);
        let mut report = EnhanceReport {
            enabled: true,
            vad_engine: match &voice {
                ResolvedVoice::Detected { engine, .. } => Some(engine.clone()),
                _ => None,
            },
            stages: Vec::new(),
        };

        let audio_duration = audio.map(AudioContext::duration);
        let mut current = segments;
        for stage in &self.stages {
            let ctx = StageContext {
                audio_duration,
                voice: match &voice {
                    ResolvedVoice::Detected { engine, intervals } => VoiceSignal::Available {
                        engine: engine.as_str(),
                        intervals: intervals.as_slice(),
                    },
                    ResolvedVoice::Unavailable { reason } => VoiceSignal::Unavailable {
                        reason: reason.as_str(),
                    },
                    ResolvedVoice::NotRequested => VoiceSignal::NotRequested,
                },
            };

            let name = stage.name();
            current = match stage.apply(current, &ctx)? {
                StageOutcome::Applied(next) => {
                    segment::verify_sequence(&next).map_err(|message| {
                        EnhanceError::InvariantViolation {
                            stage: name,
                            message,
                        }
                    })?;
                    debug!(stage = name, segments = next.len(), "stage applied");
                    report.record(name, StageStatus::Applied, None);
                    next
                }
                StageOutcome::Skipped(next) => {
                    debug!(stage = name, "stage disabled, skipped");
                    report.record(name, StageStatus::Skipped, None);
                    next
                }
                StageOutcome::Degraded { segments, reason } => {
                    warn!(stage = name, reason = %reason, "stage degraded to pass-through");
                    report.record(name, StageStatus::Degraded, Some(reason));
                    segments
                }
            };
        }

        Ok(EnhanceOutcome {
            segments: current,
            report,
        })
    }

    /// Runs the pipeline, falling back to the unchanged input if it fails.
    ///
    /// Enhancement is an optional quality layer: a fatal pipeline error is
    /// logged and the caller keeps the working un-enhanced result. Input
    /// validation errors fall back the same way (the ASR output was usable
    /// enough to reach this point).
    pub fn run_or_passthrough(
        &mut self,
        segments: Vec<Segment>,
        audio: Option<&AudioContext>,
    ) -> EnhanceOutcome {
        let fallback = segments.clone();
        match self.run(segments, audio) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, "enhancement failed, returning un-enhanced segments");
                EnhanceOutcome {
                    segments: fallback,
                    report: EnhanceReport {
                        enabled: self.config.enabled,
                        vad_engine: None,
                        stages: vec![StageRun {
                            stage: "pipeline".to_string(),
                            status: StageStatus::Degraded,
                            detail: Some(error.to_string()),
                        }],
                    },
                }
            }
        }
    }

    /// Resolves the voice-activity signal once for this invocation.
    fn resolve_voice(&mut self, audio: Option<&AudioContext>) -> ResolvedVoice {
        if !self.needs_voice() {
            return ResolvedVoice::NotRequested;
        }

        let mut detector = match self.detector_override.take() {
            Some(detector) => detector,
            None => match resolve_detector(&self.config.vad) {
                Ok(detector) => detector,
                Err(reason) => {
                    warn!(%reason, "voice-activity engine unavailable");
                    return ResolvedVoice::Unavailable { reason };
                }
            },
        };

        let Some(audio) = audio else {
            return ResolvedVoice::Unavailable {
                reason: "no audio supplied for voice-activity detection".to_string(),
            };
        };

        match detector.detect(&audio.samples, audio.sample_rate) {
            Ok(intervals) => {
                debug!(
                    engine = detector.name(),
                    intervals = intervals.len(),
                    "voice activity detected"
                );
                ResolvedVoice::Detected {
                    engine: detector.name().to_string(),
                    intervals,
                }
            }
            Err(reason) => {
                warn!(engine = detector.name(), %reason, "voice-activity detection failed");
                ResolvedVoice::Unavailable { reason }
            }
        }
    }

    fn needs_voice(&self) -> bool {
        (self.config.pipeline.contains(StageKind::Vad) && self.config.vad.enabled)
            || (self.config.pipeline.contains(StageKind::Refine) && self.config.refine.enabled)
    }
}
