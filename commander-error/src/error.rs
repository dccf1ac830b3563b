//! `Error`: what went wrong, which pipeline step hit it, and the evidence
//! needed to tell a bad config from a bad model reply.

use crate::ErrorKind;
use std::fmt;

/// Context values longer than this are cut in the one-line form. Raw model
/// replies can run to pages.
const DISPLAY_VALUE_LIMIT: usize = 120;

/// The error every commander operation returns.
///
/// `operation` names the step that failed (`config::load`,
/// `stage::extract`, ...). Context pairs carry the evidence, such as the
/// config path, the model id or the raw reply that failed to parse.
///
/// ```rust
/// use commander_error::{Error, ErrorKind};
///
/// let err = Error::parse_failed("missing field `command`", r#"{"comand":"ls"}"#)
///     .with_operation("stage::extract")
///     .with_context("model", "Qwen/Qwen2.5-32B-Instruct");
///
/// assert_eq!(err.kind(), ErrorKind::ParseFailed);
/// assert_eq!(err.context_value("raw"), Some(r#"{"comand":"ls"}"#));
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    /// Config file unreadable as YAML, or a model block incomplete
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// A model reply of the wrong shape. `raw` is kept verbatim under the
    /// `raw` context key.
    pub fn parse_failed(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message).with_context("raw", raw)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The step that failed; empty when never set
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// First context value recorded under `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Name the failing step. An outer step replaces an inner one; the inner
    /// name stays in context under `called`.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error. Set at most once; a second call is a bug
    /// and trips a debug assertion.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }
}

fn clipped(value: &str) -> std::borrow::Cow<'_, str> {
    if value.len() <= DISPLAY_VALUE_LIMIT {
        return value.into();
    }
    let mut end = DISPLAY_VALUE_LIMIT;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end]).into()
}

/// One line, printed by the CLI and written to the session log:
/// `Kind at op, context { k: v } => message`
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{}: {}", k, clipped(v)))
                .collect();
            write!(f, ", context {{ {} }}", pairs.join(", "))?;
        }
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        Ok(())
    }
}

/// Everything, unclipped, with the source chain
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation = if self.operation.is_empty() { "?" } else { self.operation };
        writeln!(f, "{} at {}: {}", self.kind, operation, self.message)?;
        for (key, value) in &self.context {
            writeln!(f, "    {}: {}", key, value)?;
        }
        if let Some(source) = &self.source {
            writeln!(f, "    caused by: {:#}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}
