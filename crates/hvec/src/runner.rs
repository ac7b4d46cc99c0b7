use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use log::debug;
use tokio::process::Command;
use crate::command::ToolCommand;
use crate::error::{HvecError, Result};

/// Spawns external tools. Every call owns its child for the whole call: the
/// process has exited (or been killed) by the time the future resolves or is
/// dropped.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    /// Run with output streamed straight to the terminal
    async fn run(&self, cmd: &ToolCommand) -> Result<()>;

    /// Run and return captured stdout
    async fn capture(&self, cmd: &ToolCommand) -> Result<Vec<u8>>;
}

/// Runs tools as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }

    fn command(cmd: &ToolCommand) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(cmd.os_args()).kill_on_drop(true);
        command
    }
}

impl ProcessRunner for SystemRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<()> {
        debug!("Executing: {}", cmd);

        let mut child = Self::command(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| spawn_error(cmd, e))?;

        let status = child.wait().await?;
        check_status(cmd, status)
    }

    async fn capture(&self, cmd: &ToolCommand) -> Result<Vec<u8>> {
        debug!("Capturing: {}", cmd);

        let output = Self::command(cmd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(cmd, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                debug!("{} stderr: {}", cmd.tool_name(), stderr.trim());
            }
        }
        check_status(cmd, output.status)?;

        Ok(output.stdout)
    }
}

fn spawn_error(cmd: &ToolCommand, err: std::io::Error) -> HvecError {
    match err.kind() {
        ErrorKind::NotFound => HvecError::ToolNotFound(cmd.tool_name()),
        _ => HvecError::Io(err),
    }
}

/// Map an exit status onto the error taxonomy; the code is reported verbatim
pub fn check_status(cmd: &ToolCommand, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(HvecError::ToolFailed { tool: cmd.tool_name(), code }),
        None => Err(HvecError::ToolTerminated { tool: cmd.tool_name() }),
    }
}
