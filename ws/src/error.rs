//! Error types for the `ws` crate.
//!
//! Follows the same pattern as the other crates in the workspace: a root `Error`
//! struct holding an error kind tree and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the realtime update core.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in the realtime update core.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Manager(ManagerErrorKind),
    Transport(TransportErrorKind),
}

/// Errors surfaced to callers of the `Manager` API.
#[derive(Debug, PartialEq)]
pub enum ManagerErrorKind {
    /// `start` was called on a manager whose event loop already ran.
    AlreadyStarted,
    /// The event loop has exited; no further registrations are accepted.
    Shutdown,
}

/// Errors raised by a transport half. These stay local to one connection.
#[derive(Debug, PartialEq)]
pub enum TransportErrorKind {
    Closed,
    Read,
    Write,
    Timeout,
}

impl Error {
    pub fn manager(kind: ManagerErrorKind) -> Self {
        Error {
            source: None,
            error_kind: ErrorKind::Manager(kind),
        }
    }

    pub fn transport<E>(kind: TransportErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error {
            source: Some(source.into()),
            error_kind: ErrorKind::Transport(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Manager(kind) => write!(f, "Manager error: {:?}", kind),
            ErrorKind::Transport(kind) => match &self.source {
                Some(source) => write!(f, "Transport error: {:?}: {}", kind, source),
                None => write!(f, "Transport error: {:?}", kind),
            },
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

impl From<TransportErrorKind> for Error {
    fn from(kind: TransportErrorKind) -> Self {
        Error {
            source: None,
            error_kind: ErrorKind::Transport(kind),
        }
    }
}
