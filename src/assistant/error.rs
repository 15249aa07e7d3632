//! Assistant error types

use thiserror::Error;

/// Assistant error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AssistantError {
    pub kind: AssistantErrorKind,
    pub message: String,
}

impl AssistantError {
    pub fn new(kind: AssistantErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Unavailable, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::InvalidRequest, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantErrorKind {
    /// Backend unreachable or overloaded
    Unavailable,
    /// Request rejected by the backend
    InvalidRequest,
}

impl AssistantErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable)
    }
}
