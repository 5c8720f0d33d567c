use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, Rgba};
use tokio::sync::watch;

use qrshare::qr::data_uri;
use qrshare::{
    ActionOutcome, Clipboard, Downloader, Drawing, Error, GenerationConfig, Launcher, Notifier,
    Platform, QrRenderer, QrStyle, QrWidget, RenderSurface, Result, StyledEncoder, ToastOptions,
    WidgetInput, WidgetOptions, WidgetState,
};

#[derive(Clone, Copy)]
enum Reply {
    Styled,
    RawImage,
    Fail,
}

/// Bit `i` set releases the `i`-th drawing request.
type Gate = Arc<watch::Sender<u64>>;

fn gate() -> Gate {
    Arc::new(watch::channel(0).0)
}

fn release(gate: &Gate, call: usize) {
    gate.send_modify(|released| *released |= 1 << call);
}

/// Records every request; can hold replies until the gate releases them.
struct RecordingRenderer {
    reply: Reply,
    calls: Mutex<Vec<GenerationConfig>>,
    gate: Option<Gate>,
    first_text: Option<String>,
}

impl RecordingRenderer {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
            gate: None,
            first_text: None,
        })
    }

    fn gated(reply: Reply, gate: Gate) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
            gate: Some(gate),
            first_text: None,
        })
    }

    /// Like `gated`, but the first request encodes `text` instead of the widget value
    fn gated_with_first_text(gate: Gate, text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Styled,
            calls: Mutex::new(Vec::new()),
            gate: Some(gate),
            first_text: Some(text.to_string()),
        })
    }

    fn calls(&self) -> Vec<GenerationConfig> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QrRenderer for RecordingRenderer {
    async fn draw(&self, config: &GenerationConfig) -> Result<Drawing> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(config.clone());
            calls.len() - 1
        };
        if let Some(gate) = &self.gate {
            let mut released = gate.subscribe();
            let _ = released.wait_for(|mask| mask & (1 << call) != 0).await;
        }

        let mut config = config.clone();
        if let (0, Some(text)) = (call, &self.first_text) {
            config.text = text.clone();
        }
        match self.reply {
            Reply::Styled => StyledEncoder::new().draw(&config).await,
            Reply::RawImage => Ok(Drawing::Image(DynamicImage::new_rgba8(256, 256))),
            Reply::Fail => Err(Error::QrEncode("renderer offline".to_string())),
        }
    }
}

#[derive(Default)]
struct RecordingClipboard {
    fail: bool,
    writes: Mutex<Vec<String>>,
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        self.writes.lock().unwrap().push(text.to_string());
        if self.fail {
            Err(Error::Clipboard("permission denied".to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct RecordingDownloader {
    files: Mutex<Vec<(String, Bytes)>>,
}

#[async_trait]
impl Downloader for RecordingDownloader {
    async fn download(&self, bytes: Bytes, filename: &str) -> Result<()> {
        self.files.lock().unwrap().push((filename.to_string(), bytes));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn open(&self, target: &str) -> Result<()> {
        self.opened.lock().unwrap().push(target.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str, _options: &ToastOptions) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str, _options: &ToastOptions) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

struct Harness {
    widget: QrWidget,
    renderer: Arc<RecordingRenderer>,
    clipboard: Arc<RecordingClipboard>,
    downloader: Arc<RecordingDownloader>,
    launcher: Arc<RecordingLauncher>,
    notifier: Arc<RecordingNotifier>,
}

fn plain_options() -> WidgetOptions {
    WidgetOptions {
        style: QrStyle {
            logo_image: None,
            ..QrStyle::default()
        },
        ..WidgetOptions::default()
    }
}

fn harness(
    input: WidgetInput,
    renderer: Arc<RecordingRenderer>,
    clipboard_fails: bool,
    options: WidgetOptions,
) -> Harness {
    let clipboard = Arc::new(RecordingClipboard {
        fail: clipboard_fails,
        ..RecordingClipboard::default()
    });
    let downloader = Arc::new(RecordingDownloader::default());
    let launcher = Arc::new(RecordingLauncher::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let platform = Platform {
        clipboard: clipboard.clone(),
        downloader: downloader.clone(),
        launcher: launcher.clone(),
        notifier: notifier.clone(),
    };
    let widget = QrWidget::new(input, renderer.clone(), platform, options);

    Harness {
        widget,
        renderer,
        clipboard,
        downloader,
        launcher,
        notifier,
    }
}

async fn wait_for_calls(renderer: &RecordingRenderer, count: usize) {
    while renderer.calls().len() < count {
        tokio::task::yield_now().await;
    }
}

fn simple(value: &str, edit_code: &str, clipboard_fails: bool) -> Harness {
    harness(
        WidgetInput::new(value, edit_code),
        RecordingRenderer::new(Reply::Styled),
        clipboard_fails,
        plain_options(),
    )
}

#[tokio::test]
async fn mount_requests_exactly_one_drawing_with_fixed_style() {
    let h = harness(
        WidgetInput::new("https://example.com/abc", "XYZ123"),
        RecordingRenderer::new(Reply::Fail),
        false,
        WidgetOptions::default(),
    );

    assert_eq!(h.widget.state(), WidgetState::Unmounted);
    h.widget.mount().unwrap();
    h.widget.settled().await;

    let calls = h.renderer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        GenerationConfig::new("https://example.com/abc", &QrStyle::default())
    );
    assert_eq!(calls[0].size, 256);
    assert_eq!(calls[0].color_dark, "#000");
    assert_eq!(calls[0].color_light, "#fff");
    assert_eq!(calls[0].logo_scale, 0.3);
    assert_eq!(calls[0].border_radius, 10);
    assert_eq!(calls[0].logo_radius, 10);
}

#[tokio::test]
async fn non_data_uri_result_is_silent_failure() {
    let h = harness(
        WidgetInput::new("https://example.com/abc", "XYZ123"),
        RecordingRenderer::new(Reply::RawImage),
        false,
        plain_options(),
    );

    h.widget.mount().unwrap();
    assert_eq!(h.widget.settled().await, WidgetState::GenerationFailed);

    assert!(h.widget.snapshot().unwrap().pixels().all(|p| p[3] == 0));
    assert!(h.notifier.successes().is_empty());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn renderer_error_is_silent_failure() {
    let h = harness(
        WidgetInput::new("https://example.com/abc", ""),
        RecordingRenderer::new(Reply::Fail),
        false,
        plain_options(),
    );

    h.widget.mount().unwrap();
    assert_eq!(h.widget.settled().await, WidgetState::GenerationFailed);
    assert!(h.widget.status().blank);
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn rendered_surface_matches_generated_image() -> anyhow::Result<()> {
    let value = "https://example.com/abc";
    let h = simple(value, "XYZ123", false);

    h.widget.mount()?;
    assert_eq!(h.widget.settled().await, WidgetState::Rendered);

    let config = GenerationConfig::new(value, &plain_options().style);
    let expected = match StyledEncoder::new().draw(&config).await? {
        Drawing::DataUri(uri) => data_uri::load_image(&uri)?.to_rgba8(),
        other => anyhow::bail!("unexpected drawing: {}", other.kind()),
    };

    assert_eq!(h.widget.snapshot().unwrap(), expected);
    assert_eq!(h.widget.scan_surface()?, value);
    Ok(())
}

#[tokio::test]
async fn download_exports_surface_png() -> anyhow::Result<()> {
    let h = simple("https://example.com/abc", "XYZ123", false);
    h.widget.mount()?;
    h.widget.settled().await;

    h.widget.download().await?;

    let files = h.downloader.files.lock().unwrap().clone();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "qr-code.png");
    let exported = image::load_from_memory(&files[0].1)?.to_rgba8();
    assert_eq!(exported, h.widget.snapshot().unwrap());
    Ok(())
}

#[tokio::test]
async fn download_after_failed_generation_exports_blank_image() -> anyhow::Result<()> {
    let h = harness(
        WidgetInput::new("https://example.com/abc", ""),
        RecordingRenderer::new(Reply::Fail),
        false,
        plain_options(),
    );
    h.widget.mount()?;
    h.widget.settled().await;

    h.widget.download().await?;

    let files = h.downloader.files.lock().unwrap().clone();
    assert_eq!(files[0].0, "qr-code.png");
    assert_eq!(files[0].1, RenderSurface::default().to_png()?);
    Ok(())
}

#[tokio::test]
async fn download_requires_mount() {
    let h = simple("https://example.com/abc", "", false);
    assert!(matches!(h.widget.download().await, Err(Error::NotMounted)));
    assert!(h.downloader.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn copy_link_without_value_reports_missing_link() {
    let h = simple("", "XYZ123", false);

    assert_eq!(h.widget.copy_link().await, ActionOutcome::Missing);
    assert!(h.clipboard.writes.lock().unwrap().is_empty());
    assert_eq!(h.notifier.errors(), vec!["Link is missing.".to_string()]);
    assert!(h.notifier.successes().is_empty());
}

#[tokio::test]
async fn copy_link_success() {
    let h = simple("https://example.com/abc", "XYZ123", false);

    assert_eq!(h.widget.copy_link().await, ActionOutcome::Done);
    assert_eq!(
        *h.clipboard.writes.lock().unwrap(),
        vec!["https://example.com/abc".to_string()]
    );
    assert_eq!(h.notifier.successes().len(), 1);
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn copy_link_failure() {
    let h = simple("https://example.com/abc", "XYZ123", true);

    assert_eq!(h.widget.copy_link().await, ActionOutcome::Failed);
    assert!(h.notifier.successes().is_empty());
    assert_eq!(h.notifier.errors(), vec!["Failed to copy link.".to_string()]);
}

#[tokio::test]
async fn empty_edit_code_is_ignored() {
    let h = simple("https://example.com/abc", "", false);

    assert_eq!(h.widget.copy_edit_code().await, ActionOutcome::Missing);
    assert!(h.clipboard.writes.lock().unwrap().is_empty());
    assert!(h.notifier.successes().is_empty());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn empty_edit_code_notifies_when_enabled() {
    let h = harness(
        WidgetInput::new("https://example.com/abc", ""),
        RecordingRenderer::new(Reply::Styled),
        false,
        WidgetOptions {
            notify_missing_edit_code: true,
            ..plain_options()
        },
    );

    assert_eq!(h.widget.copy_edit_code().await, ActionOutcome::Missing);
    assert!(h.clipboard.writes.lock().unwrap().is_empty());
    assert_eq!(h.notifier.errors(), vec!["Edit code is missing.".to_string()]);
}

#[tokio::test]
async fn copy_edit_code_failure() {
    let h = simple("https://example.com/abc", "XYZ123", true);

    assert_eq!(h.widget.copy_edit_code().await, ActionOutcome::Failed);
    assert_eq!(*h.clipboard.writes.lock().unwrap(), vec!["XYZ123".to_string()]);
    assert!(h.notifier.successes().is_empty());
    assert_eq!(
        h.notifier.errors(),
        vec!["Failed to copy edit code.".to_string()]
    );
}

#[tokio::test]
async fn copy_edit_code_success() {
    let h = simple("https://example.com/abc", "XYZ123", false);

    assert_eq!(h.widget.copy_edit_code().await, ActionOutcome::Done);
    assert_eq!(h.notifier.successes(), vec!["Edit code copied!".to_string()]);
}

#[tokio::test]
async fn unmount_discards_in_flight_generation() {
    let gate = gate();
    let h = harness(
        WidgetInput::new("https://example.com/abc", ""),
        RecordingRenderer::gated(Reply::Styled, gate.clone()),
        false,
        plain_options(),
    );

    h.widget.mount().unwrap();
    wait_for_calls(&h.renderer, 1).await;
    assert_eq!(h.widget.state(), WidgetState::Generating);
    h.widget.unmount();
    assert_eq!(h.widget.state(), WidgetState::Unmounted);

    release(&gate, 0);
    // Give the stale generation and image load time to run to completion.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    assert_eq!(h.widget.state(), WidgetState::Unmounted);
    assert!(h.widget.snapshot().is_none());
    assert_eq!(h.renderer.calls().len(), 1);
}

#[tokio::test]
async fn remount_ignores_previous_generation() {
    let value = "https://example.com/abc";
    let gate = gate();
    let h = harness(
        WidgetInput::new(value, ""),
        RecordingRenderer::gated_with_first_text(gate.clone(), "stale generation"),
        false,
        plain_options(),
    );

    h.widget.mount().unwrap();
    assert!(matches!(h.widget.mount(), Err(Error::AlreadyMounted)));
    wait_for_calls(&h.renderer, 1).await;
    h.widget.remount().unwrap();
    wait_for_calls(&h.renderer, 2).await;
    assert_eq!(h.widget.state(), WidgetState::Generating);

    // The current generation lands first, the superseded one afterwards.
    release(&gate, 1);
    assert_eq!(h.widget.settled().await, WidgetState::Rendered);
    assert_eq!(h.widget.scan_surface().unwrap(), value);

    release(&gate, 0);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    assert_eq!(h.renderer.calls().len(), 2);
    assert_eq!(h.widget.state(), WidgetState::Rendered);
    assert_eq!(h.widget.scan_surface().unwrap(), value);
}

#[tokio::test]
async fn default_options_render_a_readable_code_with_logo() -> anyhow::Result<()> {
    let value = "https://example.com/abc";
    let options = WidgetOptions::default();
    assert!(options.style.logo_image.is_some());

    let h = harness(
        WidgetInput::new(value, "XYZ123"),
        RecordingRenderer::new(Reply::Styled),
        false,
        options,
    );

    h.widget.mount()?;
    assert_eq!(h.widget.settled().await, WidgetState::Rendered);
    assert_eq!(h.widget.scan_surface()?, value);

    // Centre of the bundled logo
    let surface = h.widget.snapshot().unwrap();
    assert_eq!(surface.get_pixel(128, 128), &Rgba([15, 23, 42, 255]));
    Ok(())
}

#[tokio::test]
async fn larger_style_size_is_fitted_to_surface() -> anyhow::Result<()> {
    let value = "https://example.com/abc";
    let mut options = plain_options();
    options.style.size = 512;
    let h = harness(
        WidgetInput::new(value, ""),
        RecordingRenderer::new(Reply::Styled),
        false,
        options,
    );

    h.widget.mount()?;
    assert_eq!(h.widget.settled().await, WidgetState::Rendered);
    assert_eq!(h.renderer.calls()[0].size, 512);

    let surface = h.widget.snapshot().unwrap();
    assert_eq!(surface.dimensions(), (256, 256));
    assert_eq!(h.widget.scan_surface()?, value);
    Ok(())
}

#[tokio::test]
async fn open_link_uses_launcher() {
    let h = simple("https://example.com/abc", "", false);
    assert_eq!(h.widget.open_link().await, ActionOutcome::Done);
    assert_eq!(
        *h.launcher.opened.lock().unwrap(),
        vec!["https://example.com/abc".to_string()]
    );

    let empty = simple("", "", false);
    assert_eq!(empty.widget.open_link().await, ActionOutcome::Missing);
    assert!(empty.launcher.opened.lock().unwrap().is_empty());
    assert_eq!(empty.notifier.errors().len(), 1);
}

#[tokio::test]
async fn edit_code_label_falls_back_to_placeholder() {
    let with_code = simple("https://example.com/abc", "XYZ123", false);
    assert_eq!(with_code.widget.edit_code_label(), "XYZ123");

    let without = simple("https://example.com/abc", "", false);
    assert_eq!(without.widget.edit_code_label(), "edit code not received");
    assert_eq!(without.widget.status().edit_code_label, "edit code not received");
}
