//! Common utilities module
//!
//! Shared error taxonomy and the raster alias used by every stage.

pub mod error;

pub use error::{FacadeError, Result};

/// The pixel grid passed between stages: 8-bit RGB, owned by whichever
/// stage produced it.
pub type Image = image::RgbImage;
