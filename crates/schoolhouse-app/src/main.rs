//! Schoolhouse application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Pick the update prompt: window dialogs, terminal or unattended
//! 3. Run the startup update check and start the background update loop
//! 4. Open the page window on the main thread, or wait for Ctrl-C when
//!    headless

mod cli;
mod prompt;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use schoolhouse_core::config::{SchoolhouseConfig, UpdateConfig};
use schoolhouse_shell::{ShellWindow, WindowPrompt};
use schoolhouse_update::{CycleOutcome, HttpSource, ProcessRestarter, Trigger, UpdateChecker, UpdateLoop};

use cli::CliArgs;
use prompt::AppPrompt;

type Checker = UpdateChecker<HttpSource, AppPrompt, ProcessRestarter>;

fn build_checker(config: &UpdateConfig, prompt: AppPrompt) -> schoolhouse_core::Result<Checker> {
    // Captured before the executable can be replaced on disk.
    let restarter = ProcessRestarter::current()?;
    let source = HttpSource::from_config(config)?;
    let prompt_kind = prompt.label();
    let checker = UpdateChecker::from_config(config, source, prompt, restarter)?;
    tracing::info!(
        url = %config.url,
        artifact = %checker.artifact().path().display(),
        interval_secs = config.check_interval_secs,
        prompt = prompt_kind,
        "Update checker ready"
    );
    Ok(checker)
}

fn log_outcome(trigger: Trigger, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::UpToDate => tracing::info!(?trigger, "Application is up to date"),
        CycleOutcome::Unreachable(reason) => {
            tracing::warn!(?trigger, reason = %reason, "Could not check for updates")
        }
        CycleOutcome::Failed(e) => tracing::error!(?trigger, error = %e, "Update failed"),
        other => tracing::info!(?trigger, outcome = other.label(), "Update check finished"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SchoolhouseConfig::load_or_default(&config_file);
    args.apply_overrides(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Schoolhouse v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let gui = !args.headless && ShellWindow::is_supported();
    if !args.headless && !gui {
        tracing::warn!("Built without webview support, running headless");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // === Updates ===

    let (window_prompt, prompt_requests) = if gui {
        let (prompt, requests) = WindowPrompt::channel();
        (Some(prompt), Some(requests))
    } else {
        (None, None)
    };
    let prompt = AppPrompt::select(args.assume_yes, window_prompt);

    let checker = if !config.update.enabled {
        tracing::info!("Update checks disabled");
        None
    } else if !config.update.is_configured() {
        tracing::info!("Update checks off until update.url and update.artifact_path are set");
        None
    } else {
        match build_checker(&config.update, prompt) {
            Ok(checker) => Some(Arc::new(checker)),
            Err(e) => {
                tracing::error!(error = %e, "Update checks disabled");
                None
            }
        }
    };

    if let Some(checker) = checker.as_ref().filter(|_| config.update.check_on_startup) {
        if gui {
            // The confirmation dialog needs the window, which opens below.
            let checker = Arc::clone(checker);
            runtime.spawn(async move {
                let outcome = checker.run_cycle(Trigger::Startup).await;
                log_outcome(Trigger::Startup, &outcome);
            });
        } else {
            let outcome = runtime.block_on(checker.run_cycle(Trigger::Startup));
            log_outcome(Trigger::Startup, &outcome);
        }
    }

    let update_loop = checker.map(|checker| {
        let tick = Duration::from_secs(config.update.poll_tick_secs);
        let update_loop = Arc::new(UpdateLoop::new(checker, tick));
        let background = Arc::clone(&update_loop);
        runtime.spawn(async move { background.run().await });
        update_loop
    });

    // === Window ===

    let mut headless = !gui;
    if gui {
        let mut window = ShellWindow::new(config.shell.clone());
        if let Some(requests) = prompt_requests {
            window = window.with_prompts(requests);
        }
        if let Err(e) = window.run() {
            tracing::error!(error = %e, "Window unavailable, continuing headless");
            headless = true;
        }
    }

    if headless {
        tracing::info!("Running headless, press Ctrl-C to exit");
        if let Err(e) = runtime.block_on(tokio::signal::ctrl_c()) {
            tracing::error!(error = %e, "Failed to wait for Ctrl-C");
        }
    }

    if let Some(update_loop) = update_loop {
        update_loop.shutdown();
    }
    runtime.shutdown_timeout(Duration::from_secs(2));
    tracing::info!("Schoolhouse stopped");

    Ok(())
}
