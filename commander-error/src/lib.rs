//! # commander-error
//!
//! The one error type shared by the commander crates.
//!
//! An `Error` has an `ErrorKind` (config, I/O, model transport, reply
//! shape), the operation that failed, and context pairs such as the config
//! path or the raw model reply. Nothing retries: an error that reaches the
//! round controller ends the session, and one raised before the session
//! starts ends the process.
//!
//! ```rust
//! use commander_error::{Error, Result};
//!
//! fn extract(reply: &str) -> Result<String> {
//!     Err(Error::parse_failed("missing field `command`", reply)
//!         .with_operation("stage::extract"))
//! }
//!
//! let err = extract(r#"{"comand":"ls"}"#).unwrap_err();
//! assert_eq!(err.operation(), "stage::extract");
//! ```

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using commander Error
pub type Result<T> = std::result::Result<T, Error>;
