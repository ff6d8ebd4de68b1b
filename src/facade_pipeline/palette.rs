//! Palette classification module
//!
//! Maps segmentation-mask pixels to window, wall or unlabeled using the
//! nearest reference color with a rejection band.

mod classifier;
pub mod types;

pub use classifier::{LabelMap, PaletteClassifier};
pub use types::{ClassificationResult, ColorReferenceTable, Label};
