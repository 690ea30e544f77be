//! Error types for the `sse` crate.
//!
//! Follows the same pattern as the web layer: a root `Error` struct holding an
//! error kind and an optional source for error chaining. Per-connection send
//! failures are not errors at this level; they are reported inside a
//! [`DeliveryOutcome`](crate::outcome::DeliveryOutcome).

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Structural misuse of the delivery engine.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// A targeted delivery was requested without any subscriber ids.
    EmptyTarget,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::EmptyTarget => write!(f, "Delivery error: no target subscribers given"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Helper function to create empty-target errors.
pub fn empty_target_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::EmptyTarget,
    }
}
