//! qrshare command-line entrypoint

use clap::Parser;
#[cfg(feature = "system-clipboard")]
use qrshare::platform::SystemClipboard;
use qrshare::platform::{Clipboard, ConsoleNotifier, FileDownloader, SystemLauncher};
use qrshare::{
    ActionOutcome, Error, Platform, QrShareConfig, QrWidget, Result, StyledEncoder, WidgetInput,
    WidgetOptions, WidgetState, logging,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrshare",
    version,
    about = "Render a link as a QR code and share it"
)]
struct Cli {
    /// Link or text to encode
    value: String,

    /// Edit code shown next to the QR code
    #[arg(long, value_name = "CODE", default_value = "")]
    edit_code: String,

    /// Optional configuration file (toml/yaml). Defaults to qrshare.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory that receives qr-code.png (overrides the config file)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Logo drawn in the middle of the code
    #[arg(long, value_name = "PATH")]
    logo: Option<PathBuf>,

    /// Render without a logo
    #[arg(long, conflicts_with = "logo")]
    no_logo: bool,

    /// Save the rendered code as qr-code.png
    #[arg(long)]
    download: bool,

    /// Copy the link to the clipboard
    #[arg(long)]
    copy_link: bool,

    /// Copy the edit code to the clipboard
    #[arg(long)]
    copy_edit_code: bool,

    /// Open the link in the default browser
    #[arg(long)]
    open: bool,

    /// Print the final widget status as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QrShareConfig::load(cli.config.as_deref())?;
    if let Some(ref dir) = cli.out_dir {
        config.download.directory = dir.clone();
    }
    if let Some(ref logo) = cli.logo {
        config.style.logo_image = Some(logo.clone());
    }
    if cli.no_logo {
        config.style.logo_image = None;
    }

    logging::init(&config.logging)?;

    let platform = Platform {
        clipboard: system_clipboard(),
        downloader: Arc::new(FileDownloader::new(&config.download.directory)),
        launcher: Arc::new(SystemLauncher::new()),
        notifier: Arc::new(ConsoleNotifier::new()),
    };

    let widget = QrWidget::new(
        WidgetInput::new(cli.value.clone(), cli.edit_code.clone()),
        Arc::new(StyledEncoder::new()),
        platform,
        WidgetOptions::from(&config),
    );

    info!(style = ?config.style, "Mounting QR widget");
    widget.mount()?;
    let state = widget.settled().await;
    if state == WidgetState::GenerationFailed {
        // Generation failures are not fatal; the download still exports the blank surface.
        tracing::warn!("QR code could not be generated");
    }

    if cli.download {
        widget.download().await?;
    }

    let mut failed = false;
    if cli.copy_link {
        failed |= widget.copy_link().await == ActionOutcome::Failed;
    }
    if cli.copy_edit_code {
        failed |= widget.copy_edit_code().await == ActionOutcome::Failed;
    }
    if cli.open {
        failed |= widget.open_link().await == ActionOutcome::Failed;
    }

    let status = widget.status();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("QR state: {:?}", status.state);
        println!("Link: {}", status.link);
        println!("Edit code: {}", status.edit_code_label);
    }

    widget.unmount();

    if failed {
        return Err(Error::Other("one or more actions failed".to_string()));
    }
    Ok(())
}

#[cfg(feature = "system-clipboard")]
fn system_clipboard() -> Arc<dyn Clipboard> {
    Arc::new(SystemClipboard::new())
}

#[cfg(not(feature = "system-clipboard"))]
fn system_clipboard() -> Arc<dyn Clipboard> {
    use async_trait::async_trait;

    struct Unavailable;

    #[async_trait]
    impl Clipboard for Unavailable {
        async fn write_text(&self, _text: &str) -> Result<()> {
            Err(Error::Clipboard(
                "built without the system-clipboard feature".to_string(),
            ))
        }
    }

    Arc::new(Unavailable)
}
