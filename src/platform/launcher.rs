//! Opens links with the desktop's default handler

use crate::error::{Error, Result};
use crate::platform::Launcher;
use async_trait::async_trait;

/// Hands links to the OS via the `open` crate
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    /// Create a new launcher
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for SystemLauncher {
    async fn open(&self, target: &str) -> Result<()> {
        let target = target.to_owned();
        tokio::task::spawn_blocking(move || {
            open::that(&target).map_err(|e| Error::Launch(format!("{target}: {e}")))
        })
        .await
        .map_err(|e| Error::Launch(format!("launcher task failed: {e}")))?
    }
}
