//! Values that flow between the stages of a round

use std::fmt;
use std::path::PathBuf;

/// A single shell-invocable string, passed verbatim to `sh -c`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    command: String,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.command
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}

/// The security model's opinion of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityVerdict {
    Safe,
    Unsafe { reason: String },
}

impl SecurityVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, SecurityVerdict::Safe)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SecurityVerdict::Safe => None,
            SecurityVerdict::Unsafe { reason } => Some(reason),
        }
    }
}

/// Why a command was allowed to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clearance {
    /// The security model judged it safe
    SecurityGate,
    /// Flagged unsafe, then approved at the terminal
    Human,
}

/// What running a command produced.
///
/// stdout and stderr share one buffer. A failed run keeps its output; the
/// failure is reported through `observed()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub combined_output: String,
    pub succeeded: bool,
    pub exit_code: Option<i32>,
    /// Set when the shell could not be started at all
    pub spawn_error: Option<String>,
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            combined_output: output.into(),
            succeeded: true,
            exit_code: Some(0),
            spawn_error: None,
        }
    }

    pub fn failure(output: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            combined_output: output.into(),
            succeeded: false,
            exit_code,
            spawn_error: None,
        }
    }

    pub fn spawn_failed(error: impl Into<String>) -> Self {
        Self {
            combined_output: String::new(),
            succeeded: false,
            exit_code: None,
            spawn_error: Some(error.into()),
        }
    }

    /// Output as the reasoning model should see it, with a note appended when
    /// the command failed.
    pub fn observed(&self) -> String {
        let mut text = if self.combined_output.trim().is_empty() {
            "(no output)".to_string()
        } else {
            self.combined_output.trim_end().to_string()
        };

        if !self.succeeded {
            let note = match (&self.spawn_error, self.exit_code) {
                (Some(err), _) => format!("[the command could not be started: {}]", err),
                (None, Some(code)) => format!("[the command failed with exit status {}]", code),
                (None, None) => "[the command was terminated by a signal]".to_string(),
            };
            text.push('\n');
            text.push_str(&note);
        }
        text
    }
}

/// Where the session runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub os: String,
    pub cwd: PathBuf,
}

impl Environment {
    pub fn new(os: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            os: os.into(),
            cwd: cwd.into(),
        }
    }

    /// The running process's OS and working directory
    pub fn current() -> commander_error::Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| commander_error::Error::from(e).with_operation("environment::current"))?;
        Ok(Self::new(std::env::consts::OS, cwd))
    }
}
