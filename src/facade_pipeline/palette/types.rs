//! Palette classification types

use serde::Serialize;

use crate::facade_pipeline::common::error::{FacadeError, Result};

/// Semantic class of one mask pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Window,
    Wall,
    /// Background, or a color too far from both references.
    Unlabeled,
}

/// Reference colors for each facade class plus the rejection band.
///
/// Constant for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorReferenceTable {
    /// Pure red by default.
    pub window: [u8; 3],
    /// Pure blue by default.
    pub wall: [u8; 3],
    /// Maximum Euclidean RGB distance (inclusive) at which a pixel still
    /// counts as its nearest reference.
    pub rejection_threshold: f64,
}

/// Default rejection band. Pure black sits 255 away from both references and
/// is always rejected; half-intensity red or blue (distance 127) is accepted.
pub const DEFAULT_REJECTION_THRESHOLD: f64 = 150.0;

impl Default for ColorReferenceTable {
    fn default() -> Self {
        Self {
            window: [255, 0, 0],
            wall: [0, 0, 255],
            rejection_threshold: DEFAULT_REJECTION_THRESHOLD,
        }
    }
}

impl ColorReferenceTable {
    pub fn with_threshold(rejection_threshold: f64) -> Self {
        Self {
            rejection_threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.rejection_threshold.is_finite() || self.rejection_threshold < 0.0 {
            return Err(FacadeError::Config(format!(
                "rejection threshold must be a finite, non-negative distance, got {}",
                self.rejection_threshold
            )));
        }
        if self.window == self.wall {
            return Err(FacadeError::Config(
                "window and wall reference colors must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pixel counts for one classified mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub width: u32,
    pub height: u32,
    pub window_count: u64,
    pub wall_count: u64,
    pub unlabeled_count: u64,
}

impl ClassificationResult {
    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Pixels that belong to the facade (window or wall).
    pub fn facade_count(&self) -> u64 {
        self.window_count + self.wall_count
    }

    /// `window / (window + wall)` as a fraction, or `None` when nothing was classified.
    pub fn window_fraction(&self) -> Option<f64> {
        let facade = self.facade_count();
        (facade > 0).then(|| self.window_count as f64 / facade as f64)
    }

    pub fn record(&mut self, label: Label) {
        match label {
            Label::Window => self.window_count += 1,
            Label::Wall => self.wall_count += 1,
            Label::Unlabeled => self.unlabeled_count += 1,
        }
    }
}
