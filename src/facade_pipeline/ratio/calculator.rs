use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::common::error::{FacadeError, Result};
use crate::facade_pipeline::palette::{ClassificationResult, ColorReferenceTable, PaletteClassifier};
use crate::facade_pipeline::ratio::overlay::render_overlay;

/// Window and wall shares of the classified facade, in percent.
///
/// Unlabeled pixels are not part of the denominator: this is the glazing
/// share of the facade, not of the photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FacadeRatio {
    pub window_ratio: f64,
    pub wall_ratio: f64,
}

impl fmt::Display for FacadeRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "windows {:.1}% | wall {:.1}%", self.window_ratio, self.wall_ratio)
    }
}

/// Fails with `NoFacadeDetected` when no pixel was classified as window or wall.
pub fn compute_ratio(counts: &ClassificationResult) -> Result<FacadeRatio> {
    let facade = counts.facade_count();
    if facade == 0 {
        warn!(
            width = counts.width,
            height = counts.height,
            unlabeled = counts.unlabeled_count,
            "Mask has no classifiable facade pixels"
        );
        return Err(FacadeError::NoFacadeDetected);
    }

    let window_ratio = counts.window_count as f64 * 100.0 / facade as f64;
    Ok(FacadeRatio {
        window_ratio,
        wall_ratio: 100.0 - window_ratio,
    })
}

/// Everything an analyst needs to judge one result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioReport {
    #[serde(flatten)]
    pub counts: ClassificationResult,
    /// Share of the whole image covered by the facade, in percent.
    pub facade_share: f64,
    #[serde(flatten)]
    pub ratio: FacadeRatio,
}

impl RatioReport {
    pub fn new(counts: ClassificationResult, ratio: FacadeRatio) -> Self {
        let total = counts.total_pixels();
        let facade_share = if total == 0 {
            0.0
        } else {
            counts.facade_count() as f64 * 100.0 / total as f64
        };
        Self {
            counts,
            facade_share,
            ratio,
        }
    }

    pub fn from_counts(counts: ClassificationResult) -> Result<Self> {
        Ok(Self::new(counts, compute_ratio(&counts)?))
    }

    pub fn log_summary(&self) {
        info!(
            width = self.counts.width,
            height = self.counts.height,
            "Facade pixels: {} ({:.1}% of image), windows: {}, wall: {}",
            self.counts.facade_count(),
            self.facade_share,
            self.counts.window_count,
            self.counts.wall_count
        );
        info!("Facade ratio: {}", self.ratio);
    }
}

/// Mask in, report and overlay out. Deterministic for a given mask and base.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioCalculator {
    classifier: PaletteClassifier,
}

impl RatioCalculator {
    pub fn new(palette: ColorReferenceTable) -> Self {
        Self {
            classifier: PaletteClassifier::new(palette),
        }
    }

    /// Classifies `mask`, derives the ratio and renders the overlay onto `base`.
    pub fn calculate(&self, mask: &Image, base: &Image) -> Result<(RatioReport, Image)> {
        let (counts, labels) = self.classifier.classify_with_labels(mask);
        let ratio = compute_ratio(&counts)?;
        let overlay = render_overlay(base, &labels, &ratio)?;
        Ok((RatioReport::new(counts, ratio), overlay))
    }
}
