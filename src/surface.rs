//! The widget's drawable area

use crate::error::Result;
use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Edge length of the widget's drawing area in pixels
pub const SURFACE_SIZE: u32 = 256;

/// An RGBA canvas that holds only the most recently drawn image
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSurface {
    pixels: RgbaImage,
}

impl RenderSurface {
    /// Create a transparent surface of the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Surface width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Surface height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Reset every pixel to transparent
    pub fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| p.0 = [0, 0, 0, 0]);
    }

    /// Composite `image` with its top-left corner at (`x`, `y`), clipped to the surface
    pub fn draw_image(&mut self, image: &DynamicImage, x: i64, y: i64) {
        imageops::overlay(&mut self.pixels, &image.to_rgba8(), x, y);
    }

    /// Draw `image` stretched over the whole surface
    ///
    /// Nearest-neighbour scaling keeps QR modules crisp when a code rendered
    /// at another size lands on the fixed surface.
    pub fn draw_fitted(&mut self, image: &DynamicImage) {
        if image.dimensions() == self.pixels.dimensions() {
            self.draw_image(image, 0, 0);
            return;
        }
        let fitted = imageops::resize(
            &image.to_rgba8(),
            self.width(),
            self.height(),
            FilterType::Nearest,
        );
        imageops::overlay(&mut self.pixels, &fitted, 0, 0);
    }

    /// True while nothing visible has been drawn
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Borrow the raw pixels
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Serialize the current contents as PNG
    pub fn to_png(&self) -> Result<Bytes> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(self.pixels.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(Bytes::from(buf))
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new(SURFACE_SIZE, SURFACE_SIZE)
    }
}
