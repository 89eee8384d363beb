//! Result and error types for the core library

use serde::Serialize;
use thiserror::Error;

/// Outcome classification, the single top-level verdict of an operation.
///
/// A thin transport layer maps these onto its own status space
/// (HTTP 400/409/404/500, process exit codes, ...); the core never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Conflict,
    NotFound,
    Internal,
}

/// Core library error type
///
/// Each variant carries a stable machine-readable code (see [`Error::code`])
/// distinct from the human-readable display message, so callers can branch
/// on code without parsing text.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a bad request error
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// The outcome classification for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Database(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. }
            | Self::Conflict { code, .. }
            | Self::NotFound { code, .. } => *code,
            Self::Database(_) => "db_failure",
            Self::Io(_) => "io_failure",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
