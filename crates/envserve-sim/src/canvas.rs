//! Raster frames the tasks render into.
//!
//! [`Frame`] owns an 8-bit RGB [`image::RgbImage`]. Renderers draw on it
//! with plotters elements through a [`BitMapBackend`] borrowed over the
//! same buffer, so the finished pixels go straight to the PNG encoder.
//! Coordinates are screen space: origin top-left, y down.

use std::fmt;

use image::{Rgb, RgbImage};
use plotters::backend::BitMapBackend;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::style::RGBColor;

use crate::error::SimError;

/// An RGB color triple.
pub type Color = [u8; 3];

/// Drawing area handed to renderers by [`Frame::draw`].
pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// A rendered RGB frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Create a frame filled with `background`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Render`] if either dimension is zero.
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::Render(format!(
                "frame dimensions must be nonzero, got {width}x{height}"
            )));
        }
        Ok(Self {
            image: RgbImage::from_pixel(width, height, Rgb(background)),
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The underlying image buffer.
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Color of the pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Run `paint` against a plotters drawing area backed by this frame.
    ///
    /// Shapes falling outside the frame are clipped.
    ///
    /// # Errors
    ///
    /// Returns whatever `paint` returns, or [`SimError::Render`] if the
    /// backend fails to flush.
    pub fn draw<F>(&mut self, paint: F) -> Result<(), SimError>
    where
        F: FnOnce(&Canvas<'_>) -> Result<(), SimError>,
    {
        let (width, height) = self.image.dimensions();
        let root = BitMapBackend::with_buffer(&mut self.image, (width, height)).into_drawing_area();
        paint(&root)?;
        root.present().map_err(draw_error)
    }
}

/// Convert a color triple into a plotters color.
pub(crate) const fn rgb(color: Color) -> RGBColor {
    let [r, g, b] = color;
    RGBColor(r, g, b)
}

/// Round a screen-space point to backend pixel coordinates.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn point(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Round a length to whole pixels, clamping negatives to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn pixels(length: f64) -> u32 {
    length.round().max(0.0) as u32
}

/// Wrap a plotters drawing failure.
pub(crate) fn draw_error<E: fmt::Debug>(error: E) -> SimError {
    SimError::Render(format!("drawing failed: {error:?}"))
}
