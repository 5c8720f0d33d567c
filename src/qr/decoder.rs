//! QR code decoder using rqrr

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage, Luma, RgbaImage};

/// Reads QR content back from rendered images
#[derive(Debug, Default)]
pub struct QrDecoder {}

impl QrDecoder {
    /// Create a new QR decoder with default settings
    pub fn new() -> Self {
        Self {}
    }

    /// Decode the first QR code found in an image
    pub fn decode(&self, img: &DynamicImage) -> Result<String> {
        self.decode_rgba(&img.to_rgba8())
    }

    /// Decode an RGBA image, treating transparent pixels as white
    pub fn decode_rgba(&self, img: &RgbaImage) -> Result<String> {
        self.decode_gray(&flatten_on_white(img))
    }

    /// Decode the first QR code found in a grayscale image
    pub fn decode_gray(&self, img: &GrayImage) -> Result<String> {
        let mut prepared = rqrr::PreparedImage::prepare(img.clone());

        let grids = prepared.detect_grids();
        let grid = grids.first().ok_or(Error::NoQrCodeFound)?;

        match grid.decode() {
            Ok((meta, content)) => {
                tracing::debug!(
                    "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                    meta.version,
                    meta.ecc_level,
                    content.len()
                );
                Ok(content)
            }
            Err(e) => Err(Error::QrDecode(format!("Decode failed: {:?}", e))),
        }
    }
}

// Transparent rounded corners would otherwise read as dark modules.
fn flatten_on_white(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let alpha = f32::from(a) / 255.0;
        let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        let blended = luma * alpha + 255.0 * (1.0 - alpha);
        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}
