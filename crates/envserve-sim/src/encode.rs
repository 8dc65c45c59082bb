//! Frame transport encoding: PNG bytes, then standard base64 text.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::canvas::Frame;
use crate::error::SimError;

/// Encode a frame as an 8-bit RGB PNG.
///
/// # Errors
///
/// Returns [`SimError::Encode`] if the PNG encoder rejects the buffer.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, SimError> {
    let image = frame.image();
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Encode a frame as PNG and return it as padded standard base64.
///
/// # Errors
///
/// Returns [`SimError::Encode`] if PNG encoding fails.
pub fn encode_base64_png(frame: &Frame) -> Result<String, SimError> {
    let png = encode_png(frame)?;
    Ok(STANDARD.encode(png))
}
