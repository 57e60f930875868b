//! Error types for the maintenance domain.

use thiserror::Error;

/// Domain error type shared by every crate in the workspace.
#[derive(Debug, Error)]
pub enum Error {
    /// The session could not be established or the initial version check failed.
    #[error("cannot connect to core service: {0}")]
    Connectivity(String),

    /// A remote call faulted after the session was established.
    #[error("core service fault [{code}]: {message}")]
    RemoteService { code: String, message: String },

    /// A selection-criteria precondition was violated. Raised before any remote call.
    #[error("invalid selection: {0}")]
    Validation(String),

    /// An undo package metadata blob does not follow the five-field schema.
    #[error("malformed undo package metadata {key}: {reason}")]
    MalformedMetadata { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a malformed-metadata error for the blob stored under `key`.
    pub fn malformed(key: &str, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// The remote error code, if this is a remote fault.
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::RemoteService { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, Error>;
