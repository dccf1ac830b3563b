//! Human approval for commands the security model flagged.
//!
//! This is the only place the session waits on the terminal. There is no
//! timeout: the loop stays suspended until the user answers.

use crate::types::Command;
use commander_error::{Error, ErrorKind, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

/// What the user is asked to approve
#[derive(Debug, Clone, Copy)]
pub struct ApprovalRequest<'a> {
    pub command: &'a Command,
    pub cwd: &'a Path,
    pub reason: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    Declined,
}

pub trait Approver {
    /// Block until the user approves or declines `request`
    fn approve(&mut self, request: &ApprovalRequest<'_>) -> Result<Approval>;
}

/// Asks on a terminal-like reader/writer pair, accepting only `y` or `n`
pub struct TerminalApprover<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalApprover<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::from(e).with_operation("approval::read"))?;
        if read == 0 {
            return Err(Error::new(ErrorKind::IoFailed, "input closed while waiting for approval")
                .with_operation("approval::read"));
        }
        Ok(line.trim().to_string())
    }
}

impl TerminalApprover<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Approver for TerminalApprover<R, W> {
    fn approve(&mut self, request: &ApprovalRequest<'_>) -> Result<Approval> {
        let write_err = |e: std::io::Error| Error::from(e).with_operation("approval::prompt");

        writeln!(self.output, "The command below may be dangerous.").map_err(write_err)?;
        writeln!(self.output, "  command:   {}", request.command).map_err(write_err)?;
        writeln!(self.output, "  directory: {}", request.cwd.display()).map_err(write_err)?;
        writeln!(self.output, "  reason:    {}", request.reason).map_err(write_err)?;

        loop {
            write!(self.output, "Run it? [y/n]: ").map_err(write_err)?;
            self.output.flush().map_err(write_err)?;

            match self.read_answer()?.as_str() {
                "y" => {
                    info!(command = %request.command, "user approved flagged command");
                    return Ok(Approval::Approved);
                }
                "n" => {
                    info!(command = %request.command, "user declined flagged command");
                    return Ok(Approval::Declined);
                }
                _ => writeln!(self.output, "Please answer y or n.").map_err(write_err)?,
            }
        }
    }
}
