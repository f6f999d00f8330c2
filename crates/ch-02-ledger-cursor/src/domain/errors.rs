//! # Error Types

use thiserror::Error;

/// Envelope that looks like a request but cannot be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// `ChainCodeInvoke` with the wrong number of arguments.
    #[error("{function} expects {expected} arguments, got {actual}")]
    WrongArgCount {
        function: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A textual argument is not UTF-8.
    #[error("Argument {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// A required argument is empty.
    #[error("Argument {field} must not be empty")]
    EmptyField { field: &'static str },
}
