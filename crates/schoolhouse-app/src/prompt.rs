//! Prompt selection for the binary: a dialog in the window, the terminal
//! when headless, or a fixed answer for unattended runs.

use async_trait::async_trait;

use schoolhouse_shell::WindowPrompt;
use schoolhouse_update::{AutoPrompt, ConsolePrompt, Notice, Trigger, UserPrompt};

pub enum AppPrompt {
    Window(WindowPrompt),
    Console(ConsolePrompt),
    Auto(AutoPrompt),
}

impl AppPrompt {
    /// `assume_yes` wins; otherwise the window is used when one will open.
    pub fn select(assume_yes: bool, window: Option<WindowPrompt>) -> Self {
        match (assume_yes, window) {
            (true, _) => AppPrompt::Auto(AutoPrompt::new(true)),
            (false, Some(window)) => AppPrompt::Window(window),
            (false, None) => AppPrompt::Console(ConsolePrompt),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppPrompt::Window(_) => "window",
            AppPrompt::Console(_) => "console",
            AppPrompt::Auto(_) => "auto",
        }
    }
}

#[async_trait]
impl UserPrompt for AppPrompt {
    async fn confirm_update(&self, trigger: Trigger) -> bool {
        match self {
            AppPrompt::Window(prompt) => prompt.confirm_update(trigger).await,
            AppPrompt::Console(prompt) => prompt.confirm_update(trigger).await,
            AppPrompt::Auto(prompt) => prompt.confirm_update(trigger).await,
        }
    }

    async fn notify(&self, notice: Notice) {
        match self {
            AppPrompt::Window(prompt) => prompt.notify(notice).await,
            AppPrompt::Console(prompt) => prompt.notify(notice).await,
            AppPrompt::Auto(prompt) => prompt.notify(notice).await,
        }
    }
}
