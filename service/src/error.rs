//! Error types for feed log operations
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

#[derive(Debug, PartialEq)]
pub struct Error {
    pub error_kind: FeedLogErrorKind,
    pub message: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum FeedLogErrorKind {
    // Input rejected before it reached the log
    ValidationError,
    // No feed entry with the requested id
    RecordNotFound,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            error_kind: FeedLogErrorKind::ValidationError,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error_kind: FeedLogErrorKind::RecordNotFound,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Feed log error: {:?}: {}", self.error_kind, self.message)
    }
}

impl StdError for Error {}
