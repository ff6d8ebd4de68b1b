//! Ratio calculation module
//!
//! Aggregates classified mask pixels into the window/wall share of the facade
//! and renders the audit overlay.

mod calculator;
mod glyphs;
mod overlay;

pub use calculator::{FacadeRatio, RatioCalculator, RatioReport, compute_ratio};
pub use overlay::{WALL_TINT, WINDOW_TINT, overlay_label, render_overlay};
