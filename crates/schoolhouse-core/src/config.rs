use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SchoolhouseError};

/// Top-level configuration for the Schoolhouse shell.
///
/// Loaded from `~/.schoolhouse/config.toml` by default. Every section is
/// optional in the file and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolhouseConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub update: UpdateConfig,
    #[serde(default)]
    pub shell: ShellConfig,
}

impl SchoolhouseConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SchoolhouseConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make the update loop or the page host misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.update.poll_tick_secs == 0 {
            return Err(SchoolhouseError::Config(
                "update.poll_tick_secs must be greater than zero".to_string(),
            ));
        }
        if self.update.request_timeout_secs == 0 {
            return Err(SchoolhouseError::Config(
                "update.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self
            .update
            .artifact_path
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(SchoolhouseError::Config(
                "update.artifact_path must not be empty; remove it to turn updates off".to_string(),
            ));
        }
        if self.update.accepted_prefixes.iter().any(|p| p.is_empty()) {
            return Err(SchoolhouseError::Config(
                "update.accepted_prefixes must not contain empty tokens".to_string(),
            ));
        }
        if !(self.shell.zoom_factor > 0.0 && self.shell.zoom_factor <= 5.0) {
            return Err(SchoolhouseError::Config(format!(
                "shell.zoom_factor must be in (0, 5], got {}",
                self.shell.zoom_factor
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Self-update settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Turn update checking off entirely.
    pub enabled: bool,
    /// Run one check before the window opens.
    pub check_on_startup: bool,
    /// Location of the published artifact.
    pub url: String,
    /// Optional `sha256sum`-style manifest for the published artifact.
    pub checksum_url: Option<String>,
    /// Minimum seconds between two timer-triggered checks.
    pub check_interval_secs: u64,
    /// Seconds between timer ticks.
    pub poll_tick_secs: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Artifact to compare and replace. Update checks stay off until this
    /// is set.
    pub artifact_path: Option<String>,
    /// Tokens a candidate must start with (after leading whitespace).
    pub accepted_prefixes: Vec<String>,
    /// Keep the replaced artifact next to it as `<name>.bak`.
    pub keep_backup: bool,
}

impl UpdateConfig {
    /// Whether update checks can run: enabled, with both a source URL and a
    /// local artifact to replace.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.url.trim().is_empty()
            && self
                .artifact_path
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty())
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_on_startup: true,
            url: "https://raw.githubusercontent.com/ANA1111-111/s-scho/main/aa.py".to_string(),
            checksum_url: None,
            check_interval_secs: 3600,
            poll_tick_secs: 60,
            request_timeout_secs: 30,
            artifact_path: None,
            accepted_prefixes: vec![
                "import ".to_string(),
                "from ".to_string(),
                "#".to_string(),
                "\"\"\"".to_string(),
                "'''".to_string(),
            ],
            keep_backup: true,
        }
    }
}

/// Shell window and page host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Window title.
    pub title: String,
    /// Page shown when the window opens.
    pub initial_page: String,
    /// Magnification reapplied after every navigation.
    pub zoom_factor: f64,
    /// Open the window maximized.
    pub maximized: bool,
    /// Initial window width in logical pixels.
    pub width: u32,
    /// Initial window height in logical pixels.
    pub height: u32,
    /// Directory relative resources in pages resolve against.
    pub base_dir: String,
    /// Enable the webview developer tools.
    pub devtools: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "Smart School - Student Management System".to_string(),
            initial_page: "Dashboard.html".to_string(),
            zoom_factor: 1.35,
            maximized: true,
            width: 1280,
            height: 800,
            base_dir: ".".to_string(),
            devtools: false,
        }
    }
}
