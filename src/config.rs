//! qrshare runtime configuration handling

use crate::error::{Error, Result};
use crate::platform::{ToastOptions, ToastPosition};
use crate::qr::QrStyle;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrShareConfig {
    /// QR styling
    pub style: QrStyle,
    /// Where downloads are written
    pub download: DownloadOptions,
    /// Toast presentation
    pub toast: ToastOptions,
    /// User-facing notification texts
    pub messages: Messages,
    /// Widget behaviour switches
    pub behaviour: BehaviourOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrShareConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrshare.toml / qrshare.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrshare.toml", "qrshare.yaml", "qrshare.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrshare");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        if let Ok(logo) = env::var("QRSHARE_LOGO") {
            self.style.logo_image = if logo.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(logo))
            };
        }
        if let Ok(size) = env::var("QRSHARE_QR_SIZE") {
            if let Ok(parsed) = size.parse::<u32>() {
                self.style.size = parsed.max(1);
            }
        }
        if let Ok(dir) = env::var("QRSHARE_DOWNLOAD_DIR") {
            self.download.directory = PathBuf::from(dir);
        }
        if let Ok(position) = env::var("QRSHARE_TOAST_POSITION") {
            if let Some(parsed) = ToastPosition::parse(&position) {
                self.toast.position = parsed;
            }
        }
        if let Some(flag) = env_flag("QRSHARE_NOTIFY_MISSING_EDIT_CODE") {
            self.behaviour.notify_missing_edit_code = flag;
        }
        self.logging.apply_env_overrides();
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Download target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    /// Directory the exported PNG is written to
    pub directory: PathBuf,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

/// Widget behaviour switches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviourOptions {
    /// Show an error toast when copying an empty edit code instead of ignoring the click
    pub notify_missing_edit_code: bool,
}

/// Texts shown in toasts and labels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Messages {
    /// Link copied
    pub link_copied: String,
    /// Clipboard rejected the link
    pub link_copy_failed: String,
    /// Copy or open requested without a link
    pub link_missing: String,
    /// Link could not be opened
    pub link_open_failed: String,
    /// Edit code copied
    pub edit_code_copied: String,
    /// Clipboard rejected the edit code
    pub edit_code_copy_failed: String,
    /// Copy requested without an edit code
    pub edit_code_missing: String,
    /// Label shown in place of an empty edit code
    pub edit_code_placeholder: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            link_copied: "Link copied to clipboard!".to_string(),
            link_copy_failed: "Failed to copy link.".to_string(),
            link_missing: "Link is missing.".to_string(),
            link_open_failed: "Failed to open link.".to_string(),
            edit_code_copied: "Edit code copied!".to_string(),
            edit_code_copy_failed: "Failed to copy edit code.".to_string(),
            edit_code_missing: "Edit code is missing.".to_string(),
            edit_code_placeholder: "edit code not received".to_string(),
        }
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRSHARE_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stdout logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRSHARE_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRSHARE_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(color) = env_flag("QRSHARE_LOG_COLOR") {
            self.color = color;
        }
        if let Ok(rotation) = env::var("QRSHARE_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}
