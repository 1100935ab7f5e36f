//! User interaction for the update flow: consent before applying, and
//! notices after applying or failing.

use std::io::{BufRead, Write};

use async_trait::async_trait;

/// The consent question asked before an update is applied.
pub const UPDATE_QUESTION: &str = "A new version is available. Would you like to update now?";

/// What started an update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The check that runs once before the window opens.
    Startup,
    /// A periodic check from the update loop.
    Timer,
}

impl Trigger {
    /// Answer assumed when the user just presses Enter.
    pub fn default_accept(&self) -> bool {
        matches!(self, Trigger::Startup)
    }
}

/// Messages shown to the user outside of the consent question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The new artifact is in place; the process restarts next.
    UpdateComplete,
    /// The update was not applied.
    UpdateFailed(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::UpdateComplete => {
                "The application will now restart to apply the update.".to_string()
            }
            Notice::UpdateFailed(reason) => format!("Failed to apply update: {}", reason),
        }
    }

    /// Record the notice in the log at a level matching its severity.
    pub fn log(&self) {
        match self {
            Notice::UpdateComplete => tracing::info!("{}", self.message()),
            Notice::UpdateFailed(_) => tracing::error!("{}", self.message()),
        }
    }
}

#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// Ask whether to apply an available update. Blocks until answered.
    async fn confirm_update(&self, trigger: Trigger) -> bool;

    /// Show a notice.
    async fn notify(&self, notice: Notice);
}

/// Asks on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

#[async_trait]
impl UserPrompt for ConsolePrompt {
    async fn confirm_update(&self, trigger: Trigger) -> bool {
        let default_accept = trigger.default_accept();
        let question = format!(
            "{} {}",
            UPDATE_QUESTION,
            if default_accept { "[Y/n]" } else { "[y/N]" }
        );

        let answer = tokio::task::spawn_blocking(move || -> std::io::Result<Option<String>> {
            let mut out = std::io::stdout();
            write!(out, "{} ", question)?;
            out.flush()?;
            let mut line = String::new();
            let read = std::io::stdin().lock().read_line(&mut line)?;
            Ok((read > 0).then_some(line))
        })
        .await;

        match answer {
            Ok(Ok(Some(line))) => parse_answer(&line, default_accept),
            Ok(Ok(None)) => {
                tracing::info!("No terminal input available, declining update");
                false
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read update confirmation");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Update confirmation task failed");
                false
            }
        }
    }

    async fn notify(&self, notice: Notice) {
        notice.log();
        eprintln!("{}", notice.message());
    }
}

/// Answers every question the same way. Used for unattended runs
/// (`--assume-yes`).
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompt {
    accept: bool,
}

impl AutoPrompt {
    pub fn new(accept: bool) -> Self {
        Self { accept }
    }
}

#[async_trait]
impl UserPrompt for AutoPrompt {
    async fn confirm_update(&self, trigger: Trigger) -> bool {
        tracing::info!(?trigger, accept = self.accept, "Update confirmation answered automatically");
        self.accept
    }

    async fn notify(&self, notice: Notice) {
        notice.log();
    }
}

/// Interpret a terminal answer. Blank means the default; anything
/// unrecognised means no.
pub fn parse_answer(line: &str, default_accept: bool) -> bool {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => default_accept,
        "y" | "yes" => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_defaults() {
        assert!(Trigger::Startup.default_accept());
        assert!(!Trigger::Timer.default_accept());
    }

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n", false));
        assert!(parse_answer("  YES ", false));
        assert!(!parse_answer("n\n", true));
        assert!(!parse_answer("no", true));
        assert!(parse_answer("\n", true));
        assert!(!parse_answer("\n", false));
        assert!(!parse_answer("maybe", true));
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(
            Notice::UpdateComplete.message(),
            "The application will now restart to apply the update."
        );
        assert_eq!(
            Notice::UpdateFailed("disk full".to_string()).message(),
            "Failed to apply update: disk full"
        );
    }

    #[tokio::test]
    async fn test_auto_prompt() {
        assert!(AutoPrompt::new(true).confirm_update(Trigger::Timer).await);
        assert!(!AutoPrompt::new(false).confirm_update(Trigger::Startup).await);
        AutoPrompt::new(true).notify(Notice::UpdateComplete).await;
    }
}
