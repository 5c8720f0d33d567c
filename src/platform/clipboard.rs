//! Desktop clipboard backed by arboard

use crate::error::{Error, Result};
use crate::platform::Clipboard;
use async_trait::async_trait;

/// Writes to the system clipboard.
///
/// A fresh arboard handle is opened per write on a blocking thread. Headless
/// sessions without a clipboard owner fail with [`Error::Clipboard`].
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Create a new clipboard handle
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || {
            let mut ctx = arboard::Clipboard::new()
                .map_err(|e| Error::Clipboard(format!("clipboard init: {e}")))?;
            ctx.set_text(text)
                .map_err(|e| Error::Clipboard(format!("clipboard set: {e}")))
        })
        .await
        .map_err(|e| Error::Clipboard(format!("clipboard task failed: {e}")))?
    }
}
