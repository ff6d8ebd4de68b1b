//! Facade analysis pipeline module
//!
//! Three externally backed image stages (clean, select, mask) feed a
//! deterministic palette classifier and ratio calculator. Each component
//! lives in its own submodule so it can be exercised on its own.

pub mod common;
pub mod palette;
pub mod ratio;
pub mod stage;
pub mod orchestrator;

pub use common::{
    FacadeError,
    Result,
};

pub use palette::{
    ClassificationResult,
    ColorReferenceTable,
    Label,
    PaletteClassifier,
};

pub use ratio::{
    FacadeRatio,
    RatioCalculator,
    RatioReport,
    compute_ratio,
    render_overlay,
};

pub use stage::{
    EditRequest,
    EditResponse,
    EditorError,
    GeminiEditor,
    ImageEditor,
    StageKind,
    StageSpec,
    StageTransformer,
};

pub use orchestrator::{
    ArtifactPaths,
    FacadePipeline,
    PipelineRun,
    PipelineStep,
    PipelineTimings,
    RunFailure,
    calculate_file,
};
