//! Error types for qrshare operations

use thiserror::Error;

/// Result type alias using qrshare's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrshare operations
#[derive(Error, Debug)]
pub enum Error {
    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found on the surface
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// The renderer produced something other than a data URI
    #[error("Renderer returned {0} instead of a data URI")]
    UnexpectedDrawing(&'static str),

    /// Malformed data URI
    #[error("Invalid data URI: {0}")]
    DataUri(String),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Unparseable colour in the style
    #[error("Invalid color '{0}'")]
    Color(String),

    /// Clipboard write rejected
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Saving the downloaded file failed
    #[error("Download failed: {0}")]
    Download(String),

    /// Opening the link failed
    #[error("Failed to open link: {0}")]
    Launch(String),

    /// Operation requires a mounted widget
    #[error("Widget is not mounted")]
    NotMounted,

    /// Mount called twice without unmounting
    #[error("Widget is already mounted")]
    AlreadyMounted,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::DataUri(format!("base64 payload: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}
