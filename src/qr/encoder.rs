//! Styled QR code encoder

use crate::error::{Error, Result};
use crate::qr::data_uri;
use crate::qr::{Drawing, GenerationConfig, QrDecoder, QrRenderer};
use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Luma, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode, Version};
use std::io::Cursor;
use std::path::Path;

/// Fraction of the logo edge used as light padding around it
const LOGO_MARGIN: f32 = 0.08;

/// Largest share of the symbol the logo backing may hide. Level H restores
/// about 30% of the codewords, the rest is headroom for module edges.
const MAX_LOGO_COVERAGE: f32 = 0.2;

/// Smallest module edge in pixels that still reads back reliably
const MIN_MODULE_PX: u32 = 3;

/// Quiet zone drawn by `qrcode` on each side, in modules
const QUIET_ZONE: u32 = 4;

/// Factor applied to the logo scale when no version reads back
const LOGO_SHRINK: f32 = 0.8;
const LOGO_SHRINK_STEPS: usize = 3;

/// Renders QR codes with colours, a centred logo and rounded corners
#[derive(Debug, Clone, Default)]
pub struct StyledEncoder;

impl StyledEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self
    }

    /// Render the styled code to an RGBA image of `config.size` pixels
    ///
    /// With a logo the code is encoded at ECC level H, and at the smallest
    /// version whose grid keeps the logo backing within a fifth of the symbol.
    /// Every logo layout is read back before it is accepted. A logo that
    /// cannot be made readable is shrunk, and then dropped with a warning.
    pub fn render(&self, config: &GenerationConfig) -> Result<RgbaImage> {
        if config.size == 0 {
            return Err(Error::QrEncode("size must be positive".to_string()));
        }

        let palette = Palette {
            dark: parse_color(&config.color_dark)?,
            light: parse_color(&config.color_light)?,
        };

        if let Some(logo) = config.logo_image.as_deref().and_then(load_logo) {
            match self.render_with_logo(config, &logo, palette)? {
                Some(canvas) => return Ok(canvas),
                None => tracing::warn!(
                    size = config.size,
                    "Logo hides too much of the QR code, rendering without it"
                ),
            }
        }

        let code = QrCode::with_error_correction_level(config.text.as_bytes(), EcLevel::M)
            .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))?;
        Ok(paint(&code, config, palette, None))
    }

    fn render_with_logo(
        &self,
        config: &GenerationConfig,
        logo: &RgbaImage,
        palette: Palette,
    ) -> Result<Option<RgbaImage>> {
        let minimal = match QrCode::with_error_correction_level(config.text.as_bytes(), EcLevel::H)
        {
            Ok(code) => code,
            // Too long for level H; the caller falls back to the plain code.
            Err(_) => return Ok(None),
        };
        let first = version_number(minimal.version());
        let last = max_version(config.size).max(first);
        let decoder = QrDecoder::new();

        let mut scale = config.logo_scale.clamp(0.0, 1.0);
        for _ in 0..=LOGO_SHRINK_STEPS {
            for version in first..=last {
                let code = QrCode::with_version(
                    config.text.as_bytes(),
                    Version::Normal(version),
                    EcLevel::H,
                )
                .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))?;

                let logo_px = logo_edge(config.size, scale);
                if logo_coverage(config.size, backing_edge(config.size, logo_px), code.width())
                    > MAX_LOGO_COVERAGE
                {
                    continue;
                }

                let canvas = paint(&code, config, palette, Some((logo, logo_px)));
                if decoder.decode_rgba(&canvas).ok().as_deref() == Some(config.text.as_str()) {
                    tracing::debug!(version, scale, "Logo layout reads back");
                    return Ok(Some(canvas));
                }
            }
            scale *= LOGO_SHRINK;
        }

        Ok(None)
    }

    /// Render and PNG-encode the styled code
    pub fn render_png(&self, config: &GenerationConfig) -> Result<Vec<u8>> {
        let image = self.render(config)?;
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

#[async_trait]
impl QrRenderer for StyledEncoder {
    async fn draw(&self, config: &GenerationConfig) -> Result<Drawing> {
        let encoder = self.clone();
        let config = config.clone();
        let png = tokio::task::spawn_blocking(move || encoder.render_png(&config))
            .await
            .map_err(|e| Error::QrEncode(format!("Encoder task failed: {e}")))??;

        Ok(Drawing::DataUri(data_uri::encode_png(&png)))
    }
}

fn parse_color(value: &str) -> Result<Rgba<u8>> {
    csscolorparser::parse(value)
        .map(|color| Rgba(color.to_rgba8()))
        .map_err(|_| Error::Color(value.to_string()))
}

fn load_logo(path: &Path) -> Option<RgbaImage> {
    match image::open(path) {
        Ok(img) => Some(img.to_rgba8()),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Logo unavailable, rendering QR code without it"
            );
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    dark: Rgba<u8>,
    light: Rgba<u8>,
}

/// Draw the module grid at `config.size`, then the logo and the rounded corners
fn paint(
    code: &QrCode,
    config: &GenerationConfig,
    palette: Palette,
    logo: Option<(&RgbaImage, u32)>,
) -> RgbaImage {
    let modules = code
        .render::<Luma<u8>>()
        .module_dimensions(1, 1)
        .build();
    let scaled = imageops::resize(&modules, config.size, config.size, FilterType::Nearest);

    let mut canvas = RgbaImage::from_fn(config.size, config.size, |x, y| {
        if scaled.get_pixel(x, y)[0] < 128 {
            palette.dark
        } else {
            palette.light
        }
    });

    if let Some((logo, logo_px)) = logo {
        overlay_logo(&mut canvas, logo, logo_px, config, palette.light);
    }
    round_corners(&mut canvas, config.border_radius);

    tracing::trace!(
        version = ?code.version(),
        modules = code.width(),
        size = config.size,
        "Painted QR code"
    );

    canvas
}

fn overlay_logo(
    canvas: &mut RgbaImage,
    logo: &RgbaImage,
    logo_px: u32,
    config: &GenerationConfig,
    light: Rgba<u8>,
) {
    if logo_px == 0 {
        return;
    }

    let backing_px = backing_edge(config.size, logo_px);
    let mut backing = RgbaImage::from_pixel(backing_px, backing_px, light);
    round_corners(&mut backing, config.logo_radius);

    let mut resized = imageops::resize(logo, logo_px, logo_px, FilterType::Triangle);
    round_corners(&mut resized, config.logo_radius);

    let origin = i64::from((config.size - backing_px) / 2);
    imageops::overlay(canvas, &backing, origin, origin);
    let logo_origin = i64::from((config.size.saturating_sub(logo_px)) / 2);
    imageops::overlay(canvas, &resized, logo_origin, logo_origin);
}

fn logo_edge(size: u32, scale: f32) -> u32 {
    (size as f32 * scale).round() as u32
}

fn backing_edge(size: u32, logo_px: u32) -> u32 {
    let margin = (logo_px as f32 * LOGO_MARGIN).round() as u32;
    (logo_px + 2 * margin).min(size)
}

/// Share of the symbol (quiet zone excluded) hidden under the logo backing
fn logo_coverage(size: u32, backing_px: u32, width: usize) -> f32 {
    let width = width as f32;
    let span = width + 2.0 * QUIET_ZONE as f32;
    let hidden = backing_px as f32 / size as f32 * span;
    (hidden / width).powi(2)
}

/// Highest version whose modules stay at least [`MIN_MODULE_PX`] wide
fn max_version(size: u32) -> i16 {
    let modules = (size / MIN_MODULE_PX).saturating_sub(2 * QUIET_ZONE + 17);
    (modules / 4).clamp(1, 40) as i16
}

fn version_number(version: Version) -> i16 {
    match version {
        Version::Normal(v) | Version::Micro(v) => v,
    }
}

/// Clear every pixel that falls outside a rectangle with rounded corners
fn round_corners(image: &mut RgbaImage, radius: u32) {
    let (width, height) = image.dimensions();
    let r = radius.min(width / 2).min(height / 2) as f32;
    if r <= 0.0 {
        return;
    }

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if outside_rounded_rect(x, y, width, height, r) {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

fn outside_rounded_rect(x: u32, y: u32, width: u32, height: u32, r: f32) -> bool {
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;
    let (w, h) = (width as f32, height as f32);

    let cx = if px < r {
        r
    } else if px > w - r {
        w - r
    } else {
        return false;
    };
    let cy = if py < r {
        r
    } else if py > h - r {
        h - r
    } else {
        return false;
    };

    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy > r * r
}
