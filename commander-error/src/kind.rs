//! Error kinds for commander operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on the kind to decide how to report a failure; the round
/// controller treats every kind as fatal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid or incomplete configuration
    ConfigInvalid,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed (including terminal reads)
    IoFailed,

    // =========================================================================
    // Model errors
    // =========================================================================
    /// Could not reach the model endpoint
    NetworkFailed,

    /// The endpoint rejected the request for rate limiting
    RateLimited,

    /// The endpoint rejected the credential
    AuthenticationFailed,

    /// The model call failed or returned nothing usable
    InferenceFailed,

    /// A model reply did not have the required shape
    ParseFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",

            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ParseFailed => "ParseFailed",
        }
    }

    /// Whether the failure came from talking to a model endpoint
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::AuthenticationFailed
                | ErrorKind::InferenceFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
