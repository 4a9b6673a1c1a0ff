//! Per-invocation configuration resolution.
//!
//! Merges the three configuration layers — built-in defaults, the immutable
//! process config, and an optional per-invocation override — into one
//! validated [`ResolvedConfig`]. Resolution is field-by-field: an override
//! value wins where present, otherwise the process value (which itself
//! defaulted against the built-ins) stands.
//!
//! Unknown override keys and out-of-range values are rejected with an error
//! naming the offending key. Silently ignoring them would mask caller typos
//! and break the per-request control this layer exists to provide.

use crate::config::{Config, RefineConfig, SplitConfig, VadConfig, VadEngineKind};
use crate::error::{EnhanceError, Result};
use crate::pipeline::spec::PipelineSpec;
use serde::Deserialize;
use serde_json::Value;

/// A partial per-invocation override. Every field is optional; absent fields
/// fall through to the process configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceOverrides {
    pub pipeline: Option<String>,
    pub vad: VadOverrides,
    pub refine: RefineOverrides,
    pub split: SplitOverrides,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VadOverrides {
    pub enabled: Option<bool>,
    pub engine: Option<VadEngineKind>,
    pub silero_threshold: Option<f32>,
    pub silero_min_silence_ms: Option<u32>,
    pub webrtc_aggressiveness: Option<u8>,
    pub webrtc_min_speech_ms: Option<u32>,
    pub webrtc_max_silence_ms: Option<u32>,
    pub min_silence_duration: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RefineOverrides {
    pub enabled: Option<bool>,
    pub search_window_ms: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SplitOverrides {
    pub enabled: Option<bool>,
    pub max_duration: Option<f64>,
    pub max_chars: Option<usize>,
    pub char_duration_sec: Option<f64>,
}

impl EnhanceOverrides {
    /// Parses an override payload from a JSON value, rejecting unrecognized
    /// keys with the full dotted key path.
    pub fn from_value(value: &Value) -> Result<Self> {
        check_known_keys(value)?;
        serde_json::from_value(value.clone()).map_err(|e| EnhanceError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Parses an override payload from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| EnhanceError::ConfigParse {
            message: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

const TOP_KEYS: &[&str] = &["pipeline", "vad", "refine", "split"];
const VAD_KEYS: &[&str] = &[
    "enabled",
    "engine",
    "silero_threshold",
    "silero_min_silence_ms",
    "webrtc_aggressiveness",
    "webrtc_min_speech_ms",
    "webrtc_max_silence_ms",
    "min_silence_duration",
];
const REFINE_KEYS: &[&str] = &["enabled", "search_window_ms"];
const SPLIT_KEYS: &[&str] = &["enabled", "max_duration", "max_chars", "char_duration_sec"];

/// Walks the override object against the enumerated key schema so the error
/// can name the exact offending key (`serde`'s unknown-field message is kept
/// as a backstop for shape errors).
fn check_known_keys(value: &Value) -> Result<()> {
    let Some(map) = value.as_object() else {
        return Err(EnhanceError::ConfigParse {
            message: "override must be a JSON object".to_string(),
        });
    };

    for (key, nested) in map {
        if !TOP_KEYS.contains(&key.as_str()) {
            return Err(EnhanceError::ConfigUnknownOption { key: key.clone() });
        }
        let section_keys = match key.as_str() {
            "vad" => VAD_KEYS,
            "refine" => REFINE_KEYS,
            "split" => SPLIT_KEYS,
            _ => continue,
        };
        let Some(section) = nested.as_object() else {
            return Err(EnhanceError::ConfigParse {
                message: format!("{key} must be a JSON object"),
            });
        };
        for nested_key in section.keys() {
            if !section_keys.contains(&nested_key.as_str()) {
                return Err(EnhanceError::ConfigUnknownOption {
                    key: format!("{key}.{nested_key}"),
                });
            }
        }
    }
    Ok(())
}

/// The fully-populated configuration for one pipeline invocation.
///
/// Owned exclusively by the pipeline built from it; discarded when the
/// invocation finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub enabled: bool,
    pub include_metadata: bool,
    pub pipeline: PipelineSpec,
    pub vad: VadConfig,
    pub refine: RefineConfig,
    pub split: SplitConfig,
}

/// Resolves the three configuration layers into a validated [`ResolvedConfig`].
pub fn resolve(process: &Config, overrides: Option<&EnhanceOverrides>) -> Result<ResolvedConfig> {
    let mut vad = process.vad.clone();
    let mut refine = process.refine.clone();
    let mut split = process.split.clone();
    let mut pipeline_spec = process.pipeline.clone();

    if let Some(ov) = overrides {
        if let Some(p) = &ov.pipeline {
            pipeline_spec = p.clone();
        }
        apply_vad(&mut vad, &ov.vad);
        apply_refine(&mut refine, &ov.refine);
        apply_split(&mut split, &ov.split);
    }

    validate_vad(&vad)?;
    validate_refine(&refine)?;
    validate_split(&split)?;

    let pipeline = PipelineSpec::parse(&pipeline_spec)?;
    if process.enabled && pipeline.is_empty() {
        return Err(EnhanceError::EmptyPipeline);
    }

    Ok(ResolvedConfig {
        enabled: process.enabled,
        include_metadata: process.include_enhanced_metadata,
        pipeline,
        vad,
        refine,
        split,
    })
}

fn apply_vad(config: &mut VadConfig, ov: &VadOverrides) {
    if let Some(v) = ov.enabled {
        config.enabled = v;
    }
    if let Some(v) = ov.engine {
        config.engine = v;
    }
    if let Some(v) = ov.silero_threshold {
        config.silero_threshold = v;
    }
    if let Some(v) = ov.silero_min_silence_ms {
        config.silero_min_silence_ms = v;
    }
    if let Some(v) = ov.webrtc_aggressiveness {
        config.webrtc_aggressiveness = v;
    }
    if let Some(v) = ov.webrtc_min_speech_ms {
        config.webrtc_min_speech_ms = v;
    }
    if let Some(v) = ov.webrtc_max_silence_ms {
        config.webrtc_max_silence_ms = v;
    }
    if let Some(v) = ov.min_silence_duration {
        config.min_silence_duration = v;
    }
}

fn apply_refine(config: &mut RefineConfig, ov: &RefineOverrides) {
    if let Some(v) = ov.enabled {
        config.enabled = v;
    }
    if let Some(v) = ov.search_window_ms {
        config.search_window_ms = v;
    }
}

fn apply_split(config: &mut SplitConfig, ov: &SplitOverrides) {
    if let Some(v) = ov.enabled {
        config.enabled = v;
    }
    if let Some(v) = ov.max_duration {
        config.max_duration = v;
    }
    if let Some(v) = ov.max_chars {
        config.max_chars = v;
    }
    if let Some(v) = ov.char_duration_sec {
        config.char_duration_sec = v;
    }
}

fn invalid(key: &str, message: impl Into<String>) -> EnhanceError {
    EnhanceError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn validate_vad(config: &VadConfig) -> Result<()> {
    let t = config.silero_threshold;
    if !t.is_finite() || !(0.0..=1.0).contains(&t) {
        return Err(invalid(
            "vad.silero_threshold",
            format!("must be within 0..=1, got {t}"),
        ));
    }
    if config.webrtc_aggressiveness > 3 {
        return Err(invalid(
            "vad.webrtc_aggressiveness",
            format!("must be within 0..=3, got {}", config.webrtc_aggressiveness),
        ));
    }
    let d = config.min_silence_duration;
    if !d.is_finite() || d < 0.0 {
        return Err(invalid(
            "vad.min_silence_duration",
            format!("must be a non-negative duration in seconds, got {d}"),
        ));
    }
    Ok(())
}

fn validate_refine(config: &RefineConfig) -> Result<()> {
    if config.search_window_ms == 0 {
        return Err(invalid(
            "refine.search_window_ms",
            "must be a positive duration in milliseconds",
        ));
    }
    Ok(())
}

fn validate_split(config: &SplitConfig) -> Result<()> {
    let d = config.max_duration;
    if !d.is_finite() || d <= 0.0 {
        return Err(invalid(
            "split.max_duration",
            format!("must be a positive duration in seconds, got {d}"),
        ));
    }
    if config.max_chars == 0 {
        return Err(invalid(
            "split.max_chars",
            "must be a positive character count",
        ));
    }
    let c = config.char_duration_sec;
    if !c.is_finite() || c <= 0.0 {
        return Err(invalid(
            "split.char_duration_sec",
            format!("must be a positive duration in seconds, got {c}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn override_wins_over_process_value() {
        let mut process = Config::default();
        process.split.max_chars = 60;

        let overrides = EnhanceOverrides::from_value(&json!({
            "split": { "max_chars": 20 }
        }))
        .unwrap();

        let resolved = resolve(&process, Some(&overrides)).unwrap();
        assert_eq!(resolved.split.max_chars, 20);
    }

    #[test]
    fn process_value_wins_over_builtin_default() {
        let mut process = Config::default();
        process.refine.search_window_ms = 450;

        let resolved = resolve(&process, None).unwrap();
        assert_eq!(resolved.refine.search_window_ms, 450);
    }

    #[test]
    fn builtin_default_used_when_no_layer_speaks() {
        let resolved = resolve(&Config::default(), Some(&EnhanceOverrides::default())).unwrap();
        assert_eq!(resolved.split.max_chars, crate::defaults::MAX_SEGMENT_CHARS);
        assert_eq!(
            resolved.vad.silero_threshold,
            crate::defaults::SILERO_THRESHOLD
        );
    }

    #[test]
    fn unknown_top_level_key_is_rejected_by_name() {
        let err = EnhanceOverrides::from_value(&json!({ "pipelines": "vad" })).unwrap_err();
        match err {
            EnhanceError::ConfigUnknownOption { key } => assert_eq!(key, "pipelines"),
            other => panic!("expected ConfigUnknownOption, got {other:?}"),
        }
    }

    #[test]
    fn unknown_nested_key_is_rejected_with_dotted_path() {
        let err = EnhanceOverrides::from_value(&json!({ "vad": { "unknownOpt": 1 } })).unwrap_err();
        match err {
            EnhanceError::ConfigUnknownOption { key } => assert_eq!(key, "vad.unknownOpt"),
            other => panic!("expected ConfigUnknownOption, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_threshold_is_rejected_by_name() {
        let overrides = EnhanceOverrides::from_value(&json!({
            "vad": { "silero_threshold": 1.5 }
        }))
        .unwrap();

        let err = resolve(&Config::default(), Some(&overrides)).unwrap_err();
        match err {
            EnhanceError::ConfigInvalidValue { key, .. } => {
                assert_eq!(key, "vad.silero_threshold")
            }
            other => panic!("expected ConfigInvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_aggressiveness_is_rejected() {
        let overrides = EnhanceOverrides::from_value(&json!({
            "vad": { "webrtc_aggressiveness": 4 }
        }))
        .unwrap();

        assert!(resolve(&Config::default(), Some(&overrides)).is_err());
    }

    #[test]
    fn zero_limits_are_rejected() {
        for payload in [
            json!({ "split": { "max_chars": 0 } }),
            json!({ "split": { "max_duration": 0.0 } }),
            json!({ "split": { "char_duration_sec": 0.0 } }),
            json!({ "refine": { "search_window_ms": 0 } }),
        ] {
            let overrides = EnhanceOverrides::from_value(&payload).unwrap();
            let err = resolve(&Config::default(), Some(&overrides)).unwrap_err();
            assert!(
                matches!(err, EnhanceError::ConfigInvalidValue { .. }),
                "payload {payload} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn unknown_engine_name_fails_parse() {
        let err = EnhanceOverrides::from_value(&json!({ "vad": { "engine": "sonar" } }));
        assert!(err.is_err());
    }

    #[test]
    fn pipeline_override_is_parsed_and_validated() {
        let overrides = EnhanceOverrides::from_value(&json!({ "pipeline": "split" })).unwrap();
        let resolved = resolve(&Config::default(), Some(&overrides)).unwrap();
        assert_eq!(resolved.pipeline.to_string(), "split");

        let overrides = EnhanceOverrides::from_value(&json!({ "pipeline": "vad,warp" })).unwrap();
        assert!(matches!(
            resolve(&Config::default(), Some(&overrides)),
            Err(EnhanceError::UnknownStage { .. })
        ));
    }

    #[test]
    fn empty_pipeline_while_enabled_is_rejected() {
        let overrides = EnhanceOverrides::from_value(&json!({ "pipeline": "" })).unwrap();
        assert!(matches!(
            resolve(&Config::default(), Some(&overrides)),
            Err(EnhanceError::EmptyPipeline)
        ));
    }

    #[test]
    fn empty_pipeline_while_disabled_is_allowed() {
        let mut process = Config::default();
        process.enabled = false;
        process.pipeline = String::new();

        let resolved = resolve(&process, None).unwrap();
        assert!(!resolved.enabled);
        assert!(resolved.pipeline.is_empty());
    }

    #[test]
    fn from_json_accepts_full_payload() {
        let overrides = EnhanceOverrides::from_json(
            r#"{
                "pipeline": "vad,split",
                "vad": { "engine": "silero", "silero_threshold": 0.35 },
                "refine": { "enabled": false },
                "split": { "max_chars": 42, "max_duration": 5.0 }
            }"#,
        )
        .unwrap();

        let resolved = resolve(&Config::default(), Some(&overrides)).unwrap();
        assert_eq!(resolved.pipeline.to_string(), "vad,split");
        assert_eq!(resolved.vad.engine, VadEngineKind::Silero);
        assert_eq!(resolved.vad.silero_threshold, 0.35);
        assert!(!resolved.refine.enabled);
        assert_eq!(resolved.split.max_chars, 42);
    }
}
