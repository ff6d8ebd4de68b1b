use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::common::error::FacadeError;
use crate::facade_pipeline::orchestrator::artifacts::ArtifactPaths;
use crate::facade_pipeline::orchestrator::timing::PipelineTimings;
use crate::facade_pipeline::ratio::RatioReport;
use crate::facade_pipeline::stage::StageKind;

/// A step of a full run: loading the photo, preparing the output directory,
/// the three stages, then the ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    Load,
    Prepare,
    Clean,
    Select,
    Mask,
    Calculate,
}

impl From<StageKind> for PipelineStep {
    fn from(stage: StageKind) -> Self {
        match stage {
            StageKind::Clean => PipelineStep::Clean,
            StageKind::Select => PipelineStep::Select,
            StageKind::Mask => PipelineStep::Mask,
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStep::Load => "load",
            PipelineStep::Prepare => "prepare",
            PipelineStep::Clean => "clean",
            PipelineStep::Select => "select",
            PipelineStep::Mask => "mask",
            PipelineStep::Calculate => "calculate",
        })
    }
}

/// A run that stopped early: which step, why, and what is already on disk.
#[derive(Error, Debug)]
#[error("pipeline stopped at the {step} step: {source}")]
pub struct RunFailure {
    pub step: PipelineStep,
    #[source]
    pub source: FacadeError,
    pub artifacts: Vec<PathBuf>,
}

impl RunFailure {
    pub fn new(step: PipelineStep, source: FacadeError, artifacts: &ArtifactPaths) -> Self {
        Self {
            step,
            source,
            artifacts: artifacts.existing(),
        }
    }
}

/// Result of one complete invocation.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub clean: Image,
    pub select: Image,
    pub mask: Image,
    pub overlay: Image,
    pub report: RatioReport,
    pub artifacts: ArtifactPaths,
    pub timings: PipelineTimings,
}

impl PipelineRun {
    /// Stage outputs in pipeline order.
    pub fn stage_images(&self) -> [(StageKind, &Image); 3] {
        [
            (StageKind::Clean, &self.clean),
            (StageKind::Select, &self.select),
            (StageKind::Mask, &self.mask),
        ]
    }
}
