//! Audit overlay: classification tinted onto the photo, ratio printed on top.

use image::Rgb;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::common::error::{FacadeError, Result};
use crate::facade_pipeline::palette::{Label, LabelMap};
use crate::facade_pipeline::ratio::calculator::FacadeRatio;
use crate::facade_pipeline::ratio::glyphs::{GLYPH_HEIGHT, draw_text, text_width};

/// Tint color and its weight in percent.
pub const WINDOW_TINT: (Rgb<u8>, u32) = (Rgb([255, 30, 30]), 70);
pub const WALL_TINT: (Rgb<u8>, u32) = (Rgb([50, 100, 255]), 50);

const LABEL_ORIGIN: u32 = 5;
const LABEL_PADDING: u32 = 5;
const LABEL_SCALE: u32 = 2;

pub fn overlay_label(ratio: &FacadeRatio) -> String {
    format!("WINDOWS: {:.1}% | WALL: {:.1}%", ratio.window_ratio, ratio.wall_ratio)
}

fn blend(base: Rgb<u8>, (tint, weight): (Rgb<u8>, u32)) -> Rgb<u8> {
    let mix = |b: u8, t: u8| ((b as u32 * (100 - weight) + t as u32 * weight) / 100) as u8;
    Rgb([
        mix(base[0], tint[0]),
        mix(base[1], tint[1]),
        mix(base[2], tint[2]),
    ])
}

/// Returns a new image: `base` with window and wall pixels tinted and the
/// ratio label drawn in the top-left corner. `base` is not modified.
pub fn render_overlay(base: &Image, labels: &LabelMap, ratio: &FacadeRatio) -> Result<Image> {
    if base.dimensions() != (labels.width(), labels.height()) {
        return Err(FacadeError::InvalidDimensions(base.width(), base.height()));
    }

    let mut overlay = base.clone();
    for (x, y, pixel) in overlay.enumerate_pixels_mut() {
        match labels.get(x, y) {
            Some(Label::Window) => *pixel = blend(*pixel, WINDOW_TINT),
            Some(Label::Wall) => *pixel = blend(*pixel, WALL_TINT),
            _ => {}
        }
    }

    let text = overlay_label(ratio);
    let bar_width = text_width(&text, LABEL_SCALE) + 2 * LABEL_PADDING;
    let bar_height = GLYPH_HEIGHT * LABEL_SCALE + 2 * LABEL_PADDING;
    draw_filled_rect_mut(
        &mut overlay,
        Rect::at(LABEL_ORIGIN as i32, LABEL_ORIGIN as i32).of_size(bar_width, bar_height),
        Rgb([0, 0, 0]),
    );
    draw_text(
        &mut overlay,
        LABEL_ORIGIN + LABEL_PADDING,
        LABEL_ORIGIN + LABEL_PADDING,
        &text,
        LABEL_SCALE,
        Rgb([255, 255, 255]),
    );

    debug!(label = %text, "Overlay rendered");
    Ok(overlay)
}
