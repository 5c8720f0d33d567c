//! `data:` URI encoding and image loading

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::DynamicImage;

const PNG_PREFIX: &str = "data:image/png;base64,";

/// A parsed base64 data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Declared media type, e.g. `image/png`
    pub mime: String,
    /// Decoded payload
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse `data:<mime>;base64,<payload>`
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::DataUri("missing 'data:' scheme".to_string()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::DataUri("missing ',' separator".to_string()))?;

        let mut params = meta.split(';');
        let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(Error::DataUri("only base64 payloads are supported".to_string()));
        }

        let data = STANDARD.decode(payload.trim())?;
        Ok(Self { mime, data })
    }
}

/// Wrap PNG bytes into a data URI
pub fn encode_png(png: &[u8]) -> String {
    format!("{PNG_PREFIX}{}", STANDARD.encode(png))
}

/// Decode the image carried by a data URI
pub fn load_image(uri: &str) -> Result<DynamicImage> {
    let parsed = DataUri::parse(uri)?;
    if !parsed.mime.is_empty() && !parsed.mime.starts_with("image/") {
        return Err(Error::DataUri(format!(
            "expected an image media type, got '{}'",
            parsed.mime
        )));
    }
    Ok(image::load_from_memory(&parsed.data)?)
}
