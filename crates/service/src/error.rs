//! Service binding errors and their translation into domain errors.

use thiserror::Error;

/// Errors raised by a core service backend.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with a fault.
    #[error("service fault [{code}]: {message}")]
    Fault { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Build a fault error.
    pub fn fault(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fault {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl From<ServiceError> for cmsweep_core::Error {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Fault { code, message } => Self::RemoteService { code, message },
            ServiceError::Transport(e) => Self::RemoteService {
                code: "CommunicationError".to_string(),
                message: e.to_string(),
            },
            ServiceError::Decode(message) => Self::RemoteService {
                code: "InvalidResponse".to_string(),
                message,
            },
            ServiceError::InvalidUrl(message) => Self::Connectivity(message),
            ServiceError::Io(e) => Self::Io(e),
        }
    }
}
