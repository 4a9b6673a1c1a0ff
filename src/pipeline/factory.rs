//! Builds an executable pipeline from a resolved configuration.
//!
//! The stage registry is a closed mapping from stage kind to constructor.
//! Each stage is built independently from its own config section, so one
//! stage's configuration can never fail another stage's construction.

use crate::error::{EnhanceError, Result};
use crate::pipeline::refine_stage::RefinerStage;
use crate::pipeline::runner::Pipeline;
use crate::pipeline::spec::StageKind;
use crate::pipeline::split_stage::SplitterStage;
use crate::pipeline::stage::Stage;
use crate::pipeline::vad_stage::VadStage;
use crate::resolve::ResolvedConfig;

/// Fixed registry: one constructor per stage kind.
fn instantiate(kind: StageKind, config: &ResolvedConfig) -> Box<dyn Stage> {
    match kind {
        StageKind::Vad => Box::new(VadStage::new(config.vad.clone())),
        StageKind::Refine => Box::new(RefinerStage::new(config.refine.clone())),
        StageKind::Split => Box::new(SplitterStage::new(config.split.clone())),
    }
}

/// Builds a [`Pipeline`] executing the stages named by the resolved spec, in
/// order.
pub fn build(config: ResolvedConfig) -> Result<Pipeline> {
    if config.enabled && config.pipeline.is_empty() {
        return Err(EnhanceError::EmptyPipeline);
    }
    let stages: Vec<Box<dyn Stage>> = config
        .pipeline
        .stages()
        .iter()
        .map(|kind| instantiate(*kind, &config))
        .collect();
    Ok(Pipeline::new(config, stages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::resolve;

    #[test]
    fn builds_stages_in_spec_order() {
        let mut process = Config::default();
        process.pipeline = "split,vad".to_string();
        let resolved = resolve::resolve(&process, None).unwrap();
        let pipeline = build(resolved).unwrap();
        assert_eq!(pipeline.stage_names(), vec!["split", "vad"]);
    }

    #[test]
    fn rejects_empty_spec_while_enabled() {
        let mut process = Config::default();
        process.enabled = false;
        process.pipeline = String::new();
        let mut resolved = resolve::resolve(&process, None).unwrap();
        resolved.enabled = true;
        assert!(matches!(
            build(resolved),
            Err(EnhanceError::EmptyPipeline)
        ));
    }

    #[test]
    fn disabled_config_builds_with_no_stage_requirement() {
        let mut process = Config::default();
        process.enabled = false;
        process.pipeline = String::new();
        let resolved = resolve::resolve(&process, None).unwrap();
        let pipeline = build(resolved).unwrap();
        assert!(pipeline.stage_names().is_empty());
    }
}
