//! The QR share widget
//!
//! A [`QrWidget`] renders `value` as a QR code onto its own [`RenderSurface`] and
//! exposes the actions a user can take on it: download the image, copy the link,
//! copy the edit code and open the link.
//!
//! Generation starts on [`QrWidget::mount`] and runs in the background. Every mount
//! issues a fresh liveness token. Work that finishes after the widget was unmounted
//! or remounted finds its token revoked and is dropped without touching the surface.

use crate::config::{Messages, QrShareConfig};
use crate::error::{Error, Result};
use crate::platform::{Platform, ToastOptions};
use crate::qr::{Drawing, GenerationConfig, QrDecoder, QrRenderer, QrStyle, data_uri};
use crate::surface::RenderSurface;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// File name offered for the exported PNG
pub const DOWNLOAD_FILENAME: &str = "qr-code.png";

/// Data supplied by the owner of the widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetInput {
    /// Link or other content to encode
    pub value: String,
    /// Opaque token that authorises edits of the shared resource
    pub edit_code: String,
}

impl WidgetInput {
    /// Create an input from a link and its edit code
    pub fn new(value: impl Into<String>, edit_code: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            edit_code: edit_code.into(),
        }
    }
}

/// Lifecycle of the widget's QR image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    /// No surface exists
    Unmounted,
    /// Encoding or image loading is in flight
    Generating,
    /// The QR image is on the surface
    Rendered,
    /// Generation failed; the surface was left untouched
    GenerationFailed,
}

/// Result of a user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action went through
    Done,
    /// Nothing to act on; the platform was not called
    Missing,
    /// The platform rejected the action
    Failed,
}

/// Presentation and behaviour knobs
#[derive(Debug, Clone, Default)]
pub struct WidgetOptions {
    /// QR styling constants
    pub style: QrStyle,
    /// Passed with every toast
    pub toast: ToastOptions,
    /// Toast and label texts
    pub messages: Messages,
    /// Notify instead of silently ignoring an empty edit code
    pub notify_missing_edit_code: bool,
}

impl From<&QrShareConfig> for WidgetOptions {
    fn from(config: &QrShareConfig) -> Self {
        Self {
            style: config.style.clone(),
            toast: config.toast.clone(),
            messages: config.messages.clone(),
            notify_missing_edit_code: config.behaviour.notify_missing_edit_code,
        }
    }
}

/// Snapshot of the widget for display or JSON output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetStatus {
    /// Current lifecycle state
    pub state: WidgetState,
    /// Encoded link
    pub link: String,
    /// Edit code or its placeholder
    pub edit_code_label: String,
    /// Whether the surface has nothing drawn on it
    pub blank: bool,
}

#[derive(Debug, Clone)]
struct MountToken {
    id: Uuid,
    live: Arc<AtomicBool>,
}

impl MountToken {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn revoke(&self) {
        self.live.store(false, Ordering::Release);
    }
}

struct Mount {
    token: MountToken,
    surface: RenderSurface,
}

struct Shared {
    input: WidgetInput,
    options: WidgetOptions,
    renderer: Arc<dyn QrRenderer>,
    platform: Platform,
    mount: Mutex<Option<Mount>>,
    state: watch::Sender<WidgetState>,
}

impl Shared {
    fn lock_mount(&self) -> MutexGuard<'_, Option<Mount>> {
        self.mount.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `apply` against the surface if `token` still owns the widget.
    fn apply(
        &self,
        token: &MountToken,
        apply: impl FnOnce(&mut RenderSurface) -> WidgetState,
    ) -> bool {
        let mut slot = self.lock_mount();
        match slot.as_mut() {
            Some(mount) if mount.token.id == token.id && token.is_live() => {
                let state = apply(&mut mount.surface);
                self.state.send_replace(state);
                true
            }
            _ => {
                debug!("Discarding result of a stale generation");
                false
            }
        }
    }

    fn fail(&self, token: &MountToken) {
        self.apply(token, |_| WidgetState::GenerationFailed);
    }

    fn notify_success(&self, message: &str) {
        self.platform.notifier.success(message, &self.options.toast);
    }

    fn notify_error(&self, message: &str) {
        self.platform.notifier.error(message, &self.options.toast);
    }
}

/// Headless QR share widget
///
/// Cloning yields another handle to the same widget.
#[derive(Clone)]
pub struct QrWidget {
    shared: Arc<Shared>,
}

impl QrWidget {
    /// Create an unmounted widget
    pub fn new(
        input: WidgetInput,
        renderer: Arc<dyn QrRenderer>,
        platform: Platform,
        options: WidgetOptions,
    ) -> Self {
        let (state, _) = watch::channel(WidgetState::Unmounted);
        Self {
            shared: Arc::new(Shared {
                input,
                options,
                renderer,
                platform,
                mount: Mutex::new(None),
                state,
            }),
        }
    }

    /// The data this widget was created with
    pub fn input(&self) -> &WidgetInput {
        &self.shared.input
    }

    /// Current lifecycle state
    pub fn state(&self) -> WidgetState {
        *self.shared.state.borrow()
    }

    /// Subscribe to lifecycle changes
    pub fn subscribe(&self) -> watch::Receiver<WidgetState> {
        self.shared.state.subscribe()
    }

    /// Wait until no generation is in flight and return the resulting state
    pub async fn settled(&self) -> WidgetState {
        let mut rx = self.subscribe();
        match rx
            .wait_for(|state| *state != WidgetState::Generating)
            .await
        {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Create the surface and start generating the QR image.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(&self) -> Result<()> {
        let mut slot = self.shared.lock_mount();
        if slot.is_some() {
            return Err(Error::AlreadyMounted);
        }

        let token = MountToken::new();
        *slot = Some(Mount {
            token: token.clone(),
            surface: RenderSurface::default(),
        });
        self.shared.state.send_replace(WidgetState::Generating);
        drop(slot);

        info!(mount_id = %token.id, "Widget mounted");
        let span = info_span!("generate", mount_id = %token.id);
        tokio::spawn(generate(Arc::clone(&self.shared), token).instrument(span));
        Ok(())
    }

    /// Destroy the surface. In-flight generation is discarded when it completes.
    pub fn unmount(&self) {
        let mut slot = self.shared.lock_mount();
        if let Some(mount) = slot.take() {
            mount.token.revoke();
            self.shared.state.send_replace(WidgetState::Unmounted);
            info!(mount_id = %mount.token.id, "Widget unmounted");
        }
    }

    /// Unmount if needed, then mount again with a fresh surface
    pub fn remount(&self) -> Result<()> {
        self.unmount();
        self.mount()
    }

    /// Copy of the current surface pixels, if mounted
    pub fn snapshot(&self) -> Option<RgbaImage> {
        self.shared
            .lock_mount()
            .as_ref()
            .map(|mount| mount.surface.pixels().clone())
    }

    /// Read the encoded text back from the surface
    pub fn scan_surface(&self) -> Result<String> {
        let pixels = self.snapshot().ok_or(Error::NotMounted)?;
        QrDecoder::new().decode_rgba(&pixels)
    }

    /// Export the surface as PNG and hand it to the downloader as `qr-code.png`.
    ///
    /// A surface without a QR image exports as a blank image.
    pub async fn download(&self) -> Result<()> {
        let png = {
            let slot = self.shared.lock_mount();
            let mount = slot.as_ref().ok_or(Error::NotMounted)?;
            mount.surface.to_png()?
        };

        self.shared
            .platform
            .downloader
            .download(png, DOWNLOAD_FILENAME)
            .await
            .inspect_err(|err| error!(error = %err, "QR code download failed"))
    }

    /// Copy the link to the clipboard
    pub async fn copy_link(&self) -> ActionOutcome {
        let shared = &self.shared;
        let messages = &shared.options.messages;
        if shared.input.value.is_empty() {
            shared.notify_error(&messages.link_missing);
            return ActionOutcome::Missing;
        }

        self.copy(
            &shared.input.value,
            "link",
            &messages.link_copied,
            &messages.link_copy_failed,
        )
        .await
    }

    /// Copy the edit code to the clipboard.
    ///
    /// An empty edit code is ignored without a toast unless
    /// [`WidgetOptions::notify_missing_edit_code`] is set.
    pub async fn copy_edit_code(&self) -> ActionOutcome {
        let shared = &self.shared;
        let messages = &shared.options.messages;
        if shared.input.edit_code.is_empty() {
            if shared.options.notify_missing_edit_code {
                shared.notify_error(&messages.edit_code_missing);
            } else {
                debug!("No edit code to copy");
            }
            return ActionOutcome::Missing;
        }

        self.copy(
            &shared.input.edit_code,
            "edit code",
            &messages.edit_code_copied,
            &messages.edit_code_copy_failed,
        )
        .await
    }

    /// Open the link with the platform launcher
    pub async fn open_link(&self) -> ActionOutcome {
        let shared = &self.shared;
        if shared.input.value.is_empty() {
            shared.notify_error(&shared.options.messages.link_missing);
            return ActionOutcome::Missing;
        }

        match shared.platform.launcher.open(&shared.input.value).await {
            Ok(()) => ActionOutcome::Done,
            Err(err) => {
                error!(error = %err, "Failed to open link");
                shared.notify_error(&shared.options.messages.link_open_failed);
                ActionOutcome::Failed
            }
        }
    }

    /// Edit code, or the placeholder when none was received
    pub fn edit_code_label(&self) -> &str {
        let input = &self.shared.input;
        if input.edit_code.is_empty() {
            &self.shared.options.messages.edit_code_placeholder
        } else {
            &input.edit_code
        }
    }

    /// Summarise the widget
    pub fn status(&self) -> WidgetStatus {
        let blank = self
            .shared
            .lock_mount()
            .as_ref()
            .is_none_or(|mount| mount.surface.is_blank());
        WidgetStatus {
            state: self.state(),
            link: self.shared.input.value.clone(),
            edit_code_label: self.edit_code_label().to_string(),
            blank,
        }
    }

    async fn copy(&self, text: &str, what: &str, success: &str, failure: &str) -> ActionOutcome {
        match self.shared.platform.clipboard.write_text(text).await {
            Ok(()) => {
                debug!(what, "Copied to clipboard");
                self.shared.notify_success(success);
                ActionOutcome::Done
            }
            Err(err) => {
                error!(what, error = %err, "Clipboard write failed");
                self.shared.notify_error(failure);
                ActionOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for QrWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrWidget")
            .field("input", &self.shared.input)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn generate(shared: Arc<Shared>, token: MountToken) {
    let config = GenerationConfig::new(shared.input.value.as_str(), &shared.options.style);
    debug!(size = config.size, text_len = config.text.len(), "Requesting QR drawing");

    let uri = match shared.renderer.draw(&config).await {
        Ok(Drawing::DataUri(uri)) => uri,
        Ok(other) => {
            let err = Error::UnexpectedDrawing(other.kind());
            error!(error = %err, "QR code generation failed");
            shared.fail(&token);
            return;
        }
        Err(err) => {
            error!(error = %err, "QR code generation failed");
            shared.fail(&token);
            return;
        }
    };

    if !token.is_live() {
        debug!("Widget unmounted during generation, skipping image load");
        return;
    }

    // Image loading completes on its own schedule.
    tokio::spawn(load_and_draw(shared, token, uri).in_current_span());
}

async fn load_and_draw(shared: Arc<Shared>, token: MountToken, uri: String) {
    let image = match tokio::task::spawn_blocking(move || data_uri::load_image(&uri)).await {
        Ok(Ok(image)) => image,
        Ok(Err(err)) => {
            error!(error = %err, "Failed to load generated QR image");
            shared.fail(&token);
            return;
        }
        Err(err) => {
            error!(error = %err, "Image load task failed");
            shared.fail(&token);
            return;
        }
    };

    let drawn = shared.apply(&token, |surface| {
        surface.clear();
        surface.draw_fitted(&image);
        WidgetState::Rendered
    });
    if drawn {
        info!(width = image.width(), height = image.height(), "QR code rendered");
    } else {
        warn!("QR image loaded after the widget was torn down");
    }
}
