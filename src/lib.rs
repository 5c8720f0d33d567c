//! qrshare - headless QR share widget
//!
//! This library renders a link as a styled QR code on a widget-owned surface and
//! offers the usual sharing actions around it.
//!
//! # Features
//!
//! - **Styled QR codes**: custom colours, a centred logo and rounded corners
//! - **Async generation**: rendering runs off the caller's task, guarded against stale results
//! - **Sharing actions**: PNG download, copy link, copy edit code, open link
//! - **Pluggable platform**: clipboard, downloads, toasts and launching sit behind traits
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use qrshare::platform::{ConsoleNotifier, FileDownloader, Platform, SystemLauncher};
//! use qrshare::{Clipboard, QrWidget, StyledEncoder, WidgetInput, WidgetOptions};
//!
//! // Any clipboard works; builds with `system-clipboard` can use `SystemClipboard`.
//! struct PrintClipboard;
//!
//! #[async_trait]
//! impl Clipboard for PrintClipboard {
//!     async fn write_text(&self, text: &str) -> qrshare::Result<()> {
//!         eprintln!("clipboard: {text}");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> qrshare::Result<()> {
//!     let platform = Platform {
//!         clipboard: Arc::new(PrintClipboard),
//!         downloader: Arc::new(FileDownloader::new(".")),
//!         launcher: Arc::new(SystemLauncher::new()),
//!         notifier: Arc::new(ConsoleNotifier::new()),
//!     };
//!     let widget = QrWidget::new(
//!         WidgetInput::new("https://example.com/abc", "XYZ123"),
//!         Arc::new(StyledEncoder::new()),
//!         platform,
//!         WidgetOptions::default(),
//!     );
//!
//!     widget.mount()?;
//!     widget.settled().await;
//!     widget.download().await?;
//!     widget.copy_link().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod qr;
pub mod surface;
pub mod widget;

// Re-exports for convenience
pub use error::{Error, Result};

pub use config::{
    BehaviourOptions, DownloadOptions, LogRotation, LoggingOptions, Messages, QrShareConfig,
};
pub use platform::{
    Clipboard, Downloader, Launcher, Notifier, Platform, ToastOptions, ToastPosition,
};
pub use qr::{Drawing, GenerationConfig, QrDecoder, QrRenderer, QrStyle, StyledEncoder};
pub use surface::RenderSurface;
pub use widget::{ActionOutcome, QrWidget, WidgetInput, WidgetOptions, WidgetState, WidgetStatus};
