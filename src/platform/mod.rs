//! Host capabilities the widget depends on
//!
//! The widget talks to the outside world only through these traits, so hosts can
//! plug in a desktop clipboard, a browser bridge or a test double.

#[cfg(feature = "system-clipboard")]
mod clipboard;
mod download;
mod launcher;
mod notify;

#[cfg(feature = "system-clipboard")]
#[cfg_attr(docsrs, doc(cfg(feature = "system-clipboard")))]
pub use clipboard::SystemClipboard;
pub use download::FileDownloader;
pub use launcher::SystemLauncher;
pub use notify::ConsoleNotifier;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Text clipboard
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// File save / download
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Offer `bytes` to the user under `filename`
    async fn download(&self, bytes: Bytes, filename: &str) -> Result<()>;
}

/// Opens links in the user's browser
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Open `target`
    async fn open(&self, target: &str) -> Result<()>;
}

/// Toast notifications. Both calls are fire-and-forget.
pub trait Notifier: Send + Sync {
    /// Show a success toast
    fn success(&self, message: &str, options: &ToastOptions);
    /// Show an error toast
    fn error(&self, message: &str, options: &ToastOptions);
}

/// Bundle of capabilities handed to the widget
#[derive(Clone)]
pub struct Platform {
    /// Clipboard used by the copy actions
    pub clipboard: Arc<dyn Clipboard>,
    /// Receives the exported PNG
    pub downloader: Arc<dyn Downloader>,
    /// Opens the encoded link
    pub launcher: Arc<dyn Launcher>,
    /// User-facing notifications
    pub notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

/// Screen corner or edge where toasts appear
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToastPosition {
    /// Top left corner
    TopLeft,
    /// Top right corner
    #[default]
    TopRight,
    /// Centred at the top
    TopCenter,
    /// Bottom left corner
    BottomLeft,
    /// Bottom right corner
    BottomRight,
    /// Centred at the bottom
    BottomCenter,
}

impl ToastPosition {
    /// Parse a kebab-case position name (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top-left" => Some(Self::TopLeft),
            "top-right" => Some(Self::TopRight),
            "top-center" => Some(Self::TopCenter),
            "bottom-left" => Some(Self::BottomLeft),
            "bottom-right" => Some(Self::BottomRight),
            "bottom-center" => Some(Self::BottomCenter),
            _ => None,
        }
    }

    /// Kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::TopCenter => "top-center",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::BottomCenter => "bottom-center",
        }
    }
}

/// Presentation options passed along with every toast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToastOptions {
    /// Where the toast appears
    pub position: ToastPosition,
    /// How long the toast stays visible, in milliseconds
    pub auto_close_ms: u64,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            position: ToastPosition::default(),
            auto_close_ms: 3000,
        }
    }
}
