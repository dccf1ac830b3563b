//! Runs approved commands through the system shell.

use crate::types::{Command, ExecutionResult};
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{info, warn};

/// Captured output beyond this many bytes is cut
pub const MAX_OUTPUT_SIZE: usize = 100_000;

/// Something that can run a command. Failing commands are results, not errors.
#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn execute(&self, command: &Command) -> ExecutionResult;
}

/// Executes with `sh -c` (`cmd /C` on Windows), stderr merged into stdout
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    cwd: Option<PathBuf>,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command from `cwd`
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
        }
    }

    fn shell(command: &str) -> tokio::process::Command {
        if cfg!(target_os = "windows") {
            let mut cmd = tokio::process::Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            // Redirecting inside the shell keeps stdout and stderr in write order.
            let mut cmd = tokio::process::Command::new("sh");
            cmd.arg("-c").arg(format!("exec 2>&1\n{}", command));
            cmd
        }
    }
}

impl Executor for ShellExecutor {
    async fn execute(&self, command: &Command) -> ExecutionResult {
        let mut cmd = Self::shell(command.as_str());
        cmd.stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                warn!(command = %command, error = %e, "failed to start shell");
                return ExecutionResult::spawn_failed(e.to_string());
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        let text = truncate_output(text);

        let code = output.status.code();
        info!(
            command = %command,
            success = output.status.success(),
            exit_code = code.unwrap_or(-1),
            bytes = text.len(),
            "command finished"
        );

        if output.status.success() {
            ExecutionResult::success(text)
        } else {
            ExecutionResult::failure(text, code)
        }
    }
}

fn truncate_output(mut text: String) -> String {
    if text.len() <= MAX_OUTPUT_SIZE {
        return text;
    }
    let mut end = MAX_OUTPUT_SIZE;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text.push_str("\n... [output truncated]");
    text
}
