//! Pipeline orchestration module
//!
//! Sequences the three stages, owns artifact persistence and hands the final
//! mask to the ratio engine.

mod artifacts;
mod pipeline;
mod run;
mod timing;


pub use artifacts::{ArtifactPaths, CLEAN_FILE, MASK_FILE, OVERLAY_FILE, SELECT_FILE, load_image, save_image};
pub use pipeline::{FacadePipeline, calculate_file};
pub use run::{PipelineRun, PipelineStep, RunFailure};
pub use timing::{PipelineTimings, StepTiming, Timer};
