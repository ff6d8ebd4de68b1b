//! Image <-> transport payload conversion.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::facade_pipeline::common::Image;
use crate::facade_pipeline::common::error::{FacadeError, Result};

pub const TRANSPORT_MIME: &str = "image/png";

/// Encodes an image as PNG for the request body.
pub fn encode_png(image: &Image) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| FacadeError::EncodeError(e.to_string()))?;
    debug!("Encoded {}x{} image as {} PNG bytes", image.width(), image.height(), buffer.len());
    Ok(buffer)
}

/// Decodes any format the `image` crate recognises and normalises it to 8-bit RGB.
pub fn decode_rgb(bytes: &[u8]) -> Result<Image> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| FacadeError::DecodeError(e.to_string()))?;
    Ok(to_rgb(decoded))
}

fn to_rgb(image: DynamicImage) -> Image {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}
