//! CLI argument definitions for the Schoolhouse application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use schoolhouse_core::config::SchoolhouseConfig;

/// Schoolhouse: school management pages in a native window, kept current by
/// a self-update check.
#[derive(Parser, Debug)]
#[command(name = "schoolhouse", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Page to open first, e.g. Student.html.
    #[arg(long = "page")]
    pub page: Option<String>,

    /// Run the update loop without opening a window.
    #[arg(long = "headless")]
    pub headless: bool,

    /// Skip all update checks for this run.
    #[arg(long = "no-update-check")]
    pub no_update_check: bool,

    /// Fetch updates from this URL instead of the configured one.
    #[arg(long = "update-url")]
    pub update_url: Option<String>,

    /// Replace this file on update instead of the configured artifact.
    #[arg(long = "artifact")]
    pub artifact: Option<PathBuf>,

    /// Apply available updates without asking.
    #[arg(short = 'y', long = "assume-yes")]
    pub assume_yes: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SCHOOLHOUSE_CONFIG env var > platform default (~/.schoolhouse/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SCHOOLHOUSE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply flag overrides on top of the loaded configuration. The log
    /// level is still subject to `RUST_LOG`, which takes priority over both.
    pub fn apply_overrides(&self, config: &mut SchoolhouseConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref page) = self.page {
            config.shell.initial_page = page.clone();
        }
        if let Some(ref url) = self.update_url {
            config.update.url = url.clone();
        }
        if let Some(ref artifact) = self.artifact {
            config.update.artifact_path = Some(artifact.to_string_lossy().to_string());
        }
        if self.no_update_check {
            config.update.enabled = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".schoolhouse").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".schoolhouse").join("config.toml");
    }
    PathBuf::from("config.toml")
}
