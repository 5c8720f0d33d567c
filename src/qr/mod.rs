//! QR code generation and read-back
//!
//! The widget never encodes QR codes itself. It hands a [`GenerationConfig`] to a
//! [`QrRenderer`] and expects a `data:` URI back. [`StyledEncoder`] is the built-in
//! renderer; [`QrDecoder`] reads the text back from a rendered image.

pub mod data_uri;
mod decoder;
mod encoder;

pub use decoder::QrDecoder;
pub use encoder::StyledEncoder;

use crate::error::Result;
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Edge length of the generated image in pixels
pub const DEFAULT_SIZE: u32 = 256;
/// Colour of dark modules
pub const DEFAULT_COLOR_DARK: &str = "#000";
/// Colour of light modules and the logo backing
pub const DEFAULT_COLOR_LIGHT: &str = "#fff";
/// Logo edge length as a fraction of the image size
pub const DEFAULT_LOGO_SCALE: f32 = 0.3;
/// Corner rounding of the whole image in pixels
pub const DEFAULT_BORDER_RADIUS: u32 = 10;
/// Corner rounding of the logo in pixels
pub const DEFAULT_LOGO_RADIUS: u32 = 10;
/// Logo bundled with the application assets
pub const DEFAULT_LOGO_PATH: &str = "assets/logo.png";

/// Fixed styling applied to every generated code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrStyle {
    /// Output edge length in pixels
    pub size: u32,
    /// CSS colour of dark modules
    pub color_dark: String,
    /// CSS colour of light modules
    pub color_light: String,
    /// Logo drawn in the centre of the code
    pub logo_image: Option<PathBuf>,
    /// Logo edge length relative to `size`
    pub logo_scale: f32,
    /// Outer corner radius in pixels
    pub border_radius: u32,
    /// Logo corner radius in pixels
    pub logo_radius: u32,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            color_dark: DEFAULT_COLOR_DARK.to_string(),
            color_light: DEFAULT_COLOR_LIGHT.to_string(),
            logo_image: Some(PathBuf::from(DEFAULT_LOGO_PATH)),
            logo_scale: DEFAULT_LOGO_SCALE,
            border_radius: DEFAULT_BORDER_RADIUS,
            logo_radius: DEFAULT_LOGO_RADIUS,
        }
    }
}

/// A single request to the QR renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Content to encode
    pub text: String,
    /// Output edge length in pixels
    pub size: u32,
    /// CSS colour of dark modules
    pub color_dark: String,
    /// CSS colour of light modules
    pub color_light: String,
    /// Optional logo overlay
    pub logo_image: Option<PathBuf>,
    /// Logo edge length relative to `size`
    pub logo_scale: f32,
    /// Outer corner radius in pixels
    pub border_radius: u32,
    /// Logo corner radius in pixels
    pub logo_radius: u32,
}

impl GenerationConfig {
    /// Build a request for `text` using the given style
    pub fn new(text: impl Into<String>, style: &QrStyle) -> Self {
        Self {
            text: text.into(),
            size: style.size,
            color_dark: style.color_dark.clone(),
            color_light: style.color_light.clone(),
            logo_image: style.logo_image.clone(),
            logo_scale: style.logo_scale,
            border_radius: style.border_radius,
            logo_radius: style.logo_radius,
        }
    }
}

/// What a renderer hands back
#[derive(Debug, Clone)]
pub enum Drawing {
    /// A `data:` URI containing the encoded image
    DataUri(String),
    /// A decoded image. The widget only accepts data URIs and treats this as a failure.
    Image(DynamicImage),
}

impl Drawing {
    /// Short name of the variant for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Drawing::DataUri(_) => "data URI",
            Drawing::Image(_) => "raw image",
        }
    }
}

/// The QR-encoding service used by the widget
#[async_trait]
pub trait QrRenderer: Send + Sync {
    /// Produce an image for the requested text and style
    async fn draw(&self, config: &GenerationConfig) -> Result<Drawing>;
}
