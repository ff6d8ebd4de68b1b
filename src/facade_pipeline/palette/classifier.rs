//! Nearest-reference palette classifier.
//!
//! The external mask generator is asked for flat red/blue/black output but
//! anti-aliases edges and drifts colors, so every pixel is snapped to the
//! closer of the two references and rejected when neither is close enough.

use image::Rgb;
use tracing::debug;

use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::palette::types::{ClassificationResult, ColorReferenceTable, Label};

/// Per-pixel labels for one mask, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<Label>,
}

impl LabelMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Label> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.labels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Pure function from mask pixels to labels. Holds nothing but the reference table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteClassifier {
    table: ColorReferenceTable,
}

fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

impl PaletteClassifier {
    pub fn new(table: ColorReferenceTable) -> Self {
        Self { table }
    }

    /// Labels one color.
    ///
    /// Distances are compared squared in integers, so the inclusive boundary
    /// is exact for integral thresholds. Equidistant pixels inside the band
    /// resolve to `Wall`.
    pub fn classify_pixel(&self, pixel: Rgb<u8>) -> Label {
        let d_window = squared_distance(pixel.0, self.table.window);
        let d_wall = squared_distance(pixel.0, self.table.wall);

        let (label, nearest) = if d_window < d_wall {
            (Label::Window, d_window)
        } else {
            (Label::Wall, d_wall)
        };

        let limit = self.table.rejection_threshold * self.table.rejection_threshold;
        if nearest as f64 <= limit {
            label
        } else {
            Label::Unlabeled
        }
    }

    /// Counts labels over the whole mask.
    pub fn classify(&self, mask: &Image) -> ClassificationResult {
        let mut result = Self::empty_result(mask);
        for pixel in mask.pixels() {
            result.record(self.classify_pixel(*pixel));
        }
        debug!(
            window = result.window_count,
            wall = result.wall_count,
            unlabeled = result.unlabeled_count,
            "Mask classified"
        );
        result
    }

    /// Counts and the per-pixel map the overlay renderer needs.
    pub fn classify_with_labels(&self, mask: &Image) -> (ClassificationResult, LabelMap) {
        let mut result = Self::empty_result(mask);
        let mut labels = Vec::with_capacity(mask.width() as usize * mask.height() as usize);
        for pixel in mask.pixels() {
            let label = self.classify_pixel(*pixel);
            result.record(label);
            labels.push(label);
        }
        let map = LabelMap {
            width: mask.width(),
            height: mask.height(),
            labels,
        };
        (result, map)
    }

    fn empty_result(mask: &Image) -> ClassificationResult {
        ClassificationResult {
            width: mask.width(),
            height: mask.height(),
            window_count: 0,
            wall_count: 0,
            unlabeled_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn classifier_with(threshold: f64) -> PaletteClassifier {
        PaletteClassifier::new(ColorReferenceTable::with_threshold(threshold))
    }

    #[test]
    fn test_pure_palette_colors() {
        let classifier = PaletteClassifier::default();
        assert_eq!(classifier.classify_pixel(Rgb([255, 0, 0])), Label::Window);
        assert_eq!(classifier.classify_pixel(Rgb([0, 0, 255])), Label::Wall);
        assert_eq!(classifier.classify_pixel(Rgb([0, 0, 0])), Label::Unlabeled);
        assert_eq!(classifier.classify_pixel(Rgb([255, 255, 255])), Label::Unlabeled);
    }

    #[test]
    fn test_drifted_colors_snap_to_nearest() {
        let classifier = PaletteClassifier::default();
        assert_eq!(classifier.classify_pixel(Rgb([230, 20, 25])), Label::Window);
        assert_eq!(classifier.classify_pixel(Rgb([15, 30, 220])), Label::Wall);
        assert_eq!(classifier.classify_pixel(Rgb([128, 0, 0])), Label::Window);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let classifier = classifier_with(100.0);
        // Exactly 100 away from pure red.
        assert_eq!(classifier.classify_pixel(Rgb([255, 0, 100])), Label::Window);
        assert_eq!(classifier.classify_pixel(Rgb([255, 100, 0])), Label::Window);
        // One unit beyond.
        assert_eq!(classifier.classify_pixel(Rgb([255, 0, 101])), Label::Unlabeled);
        assert_eq!(classifier.classify_pixel(Rgb([255, 101, 0])), Label::Unlabeled);

        // Same on the wall side.
        assert_eq!(classifier.classify_pixel(Rgb([0, 100, 255])), Label::Wall);
        assert_eq!(classifier.classify_pixel(Rgb([0, 101, 255])), Label::Unlabeled);
    }

    #[test]
    fn test_zero_threshold_accepts_only_exact_references() {
        let classifier = classifier_with(0.0);
        assert_eq!(classifier.classify_pixel(Rgb([255, 0, 0])), Label::Window);
        assert_eq!(classifier.classify_pixel(Rgb([254, 0, 0])), Label::Unlabeled);
    }

    #[test]
    fn test_equidistant_pixels_resolve_to_wall() {
        let classifier = classifier_with(200.0);
        // r == b means equal distance to both references.
        for pixel in [Rgb([128, 0, 128]), Rgb([100, 50, 100]), Rgb([120, 40, 120])] {
            for _ in 0..3 {
                assert_eq!(classifier.classify_pixel(pixel), Label::Wall);
            }
        }
    }

    #[test]
    fn test_equidistant_outside_band_is_unlabeled() {
        let classifier = PaletteClassifier::default();
        // ~180 from both references, beyond the default band.
        assert_eq!(classifier.classify_pixel(Rgb([128, 0, 128])), Label::Unlabeled);
    }

    #[test]
    fn test_partition_covers_every_pixel() {
        let mut mask = RgbImage::new(7, 5);
        for (x, y, pixel) in mask.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 37) as u8, (y * 51) as u8, ((x + y) * 23) as u8]);
        }
        let result = PaletteClassifier::default().classify(&mask);
        assert_eq!(
            result.window_count + result.wall_count + result.unlabeled_count,
            7 * 5
        );
        assert_eq!(result.total_pixels(), 35);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let mut mask = RgbImage::new(16, 16);
        for (x, y, pixel) in mask.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 16) as u8, 0, (y * 16) as u8]);
        }
        let classifier = PaletteClassifier::default();
        let first = classifier.classify_with_labels(&mask);
        let second = classifier.classify_with_labels(&mask);
        assert_eq!(first, second);
        assert_eq!(first.0, classifier.classify(&mask));
    }

    #[test]
    fn test_label_map_lookup() {
        let mut mask = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        mask.put_pixel(2, 1, Rgb([255, 0, 0]));
        mask.put_pixel(0, 0, Rgb([0, 0, 255]));
        let (_, map) = PaletteClassifier::default().classify_with_labels(&mask);
        assert_eq!(map.get(2, 1), Some(Label::Window));
        assert_eq!(map.get(0, 0), Some(Label::Wall));
        assert_eq!(map.get(1, 1), Some(Label::Unlabeled));
        assert_eq!(map.get(3, 0), None);
    }

    #[test]
    fn test_empty_mask() {
        let mask = RgbImage::new(0, 0);
        let result = PaletteClassifier::default().classify(&mask);
        assert_eq!(result.total_pixels(), 0);
        assert_eq!(result.window_fraction(), None);
    }
}
