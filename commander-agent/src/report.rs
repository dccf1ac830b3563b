//! User-facing progress output, kept apart from diagnostic logging so the
//! controller can run against any sink.

use crate::types::{Command, ExecutionResult};

pub trait Reporter {
    /// Neutral progress line
    fn status(&self, message: &str);

    /// Something the user should notice
    fn warn(&self, message: &str);

    /// The structured model proposed a command
    fn command(&self, command: &Command);

    /// A command finished
    fn executed(&self, command: &Command, result: &ExecutionResult);
}
