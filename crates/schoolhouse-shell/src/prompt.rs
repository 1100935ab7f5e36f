//! Update prompts shown as dialogs inside the page window.
//!
//! [`WindowPrompt`] is the [`UserPrompt`] used when the window runs. Each
//! question becomes a [`PromptRequest`] on a channel; the window turns it
//! into a `confirm()` or `alert()` in the webview and sends the answer back.
//! If the window is gone before answering, the update is declined.

use async_trait::async_trait;
use schoolhouse_update::{Notice, Trigger, UserPrompt, UPDATE_QUESTION};
use tokio::sync::{mpsc, oneshot};

/// A dialog to show in the page window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// OK/Cancel question.
    Confirm(String),
    /// Message the user dismisses.
    Alert(String),
}

impl Dialog {
    /// Script that opens the dialog and evaluates to its result.
    pub fn script(&self) -> String {
        let (function, message) = match self {
            Dialog::Confirm(message) => ("confirm", message),
            Dialog::Alert(message) => ("alert", message),
        };
        let literal = serde_json::Value::String(message.clone());
        format!("window.{}({})", function, literal)
    }

    /// Interpret the JSON result of [`Dialog::script`].
    pub fn answer(&self, raw: &str) -> bool {
        match self {
            Dialog::Confirm(_) => raw.trim() == "true",
            Dialog::Alert(_) => true,
        }
    }
}

/// A dialog waiting to be shown, with the channel its answer goes back on.
#[derive(Debug)]
pub struct PromptRequest {
    pub dialog: Dialog,
    pub reply: oneshot::Sender<bool>,
}

/// Receiving side handed to [`crate::ShellWindow::with_prompts`].
pub type PromptRequests = mpsc::UnboundedReceiver<PromptRequest>;

#[derive(Debug, Clone)]
pub struct WindowPrompt {
    requests: mpsc::UnboundedSender<PromptRequest>,
}

impl WindowPrompt {
    /// Create a prompt and the request stream the window serves.
    pub fn channel() -> (Self, PromptRequests) {
        let (requests, receiver) = mpsc::unbounded_channel();
        (Self { requests }, receiver)
    }

    /// Show a dialog and wait for it to close. `None` if the window is gone.
    async fn ask(&self, dialog: Dialog) -> Option<bool> {
        let (reply, answer) = oneshot::channel();
        self.requests.send(PromptRequest { dialog, reply }).ok()?;
        answer.await.ok()
    }
}

#[async_trait]
impl UserPrompt for WindowPrompt {
    async fn confirm_update(&self, trigger: Trigger) -> bool {
        match self.ask(Dialog::Confirm(UPDATE_QUESTION.to_string())).await {
            Some(accept) => {
                tracing::info!(?trigger, accept, "Update confirmation answered");
                accept
            }
            None => {
                tracing::warn!(?trigger, "Window unavailable, declining update");
                false
            }
        }
    }

    async fn notify(&self, notice: Notice) {
        notice.log();
        if self.ask(Dialog::Alert(notice.message())).await.is_none() {
            tracing::debug!("Window unavailable, notice only logged");
        }
    }
}
