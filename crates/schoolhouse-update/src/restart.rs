//! Process restart after an applied update.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use crate::error::UpdateError;

/// Replaces the running process with a fresh one.
///
/// On success the production implementation does not return.
pub trait Restarter: Send + Sync {
    fn restart(&self) -> Result<(), UpdateError>;
}

/// Re-executes the current executable with the original arguments.
#[derive(Debug, Clone)]
pub struct ProcessRestarter {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessRestarter {
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Capture the current executable and its arguments. Call once at startup,
    /// before the executable can be replaced on disk.
    pub fn current() -> Result<Self, UpdateError> {
        let program = std::env::current_exe()
            .map_err(|e| UpdateError::RestartFailed(format!("current executable: {}", e)))?;
        Ok(Self::new(program, std::env::args_os().skip(1).collect()))
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl Restarter for ProcessRestarter {
    fn restart(&self) -> Result<(), UpdateError> {
        tracing::info!(program = %self.program.display(), "Restarting");
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        Err(exec_replacement(command))
    }
}

#[cfg(unix)]
fn exec_replacement(mut command: Command) -> UpdateError {
    use std::os::unix::process::CommandExt;

    // Only returns on failure.
    let err = command.exec();
    UpdateError::RestartFailed(err.to_string())
}

#[cfg(not(unix))]
fn exec_replacement(mut command: Command) -> UpdateError {
    match command.spawn() {
        Ok(_) => std::process::exit(0),
        Err(e) => UpdateError::RestartFailed(e.to_string()),
    }
}
