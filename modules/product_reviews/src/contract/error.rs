use fwkit::{ErrorKind, FwError};
use thiserror::Error;

use crate::domain::error::DomainError;

/// Errors that are safe to show to callers of this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProductReviewsError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{message}")]
    Unavailable { message: String, retriable: bool },

    #[error("{summary}")]
    PartialFailure { summary: String },

    #[error("{operation} is already in progress")]
    Busy { operation: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ProductReviewsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable { retriable: true, .. })
    }
}

impl From<FwError> for ProductReviewsError {
    fn from(e: FwError) -> Self {
        match e.kind() {
            ErrorKind::NotFound => Self::NotFound {
                message: e.message().to_string(),
            },
            ErrorKind::InvalidArgument | ErrorKind::ClientError => Self::validation(e.message()),
            ErrorKind::Decoding | ErrorKind::Unknown => Self::Internal {
                message: e.message().to_string(),
            },
            _ => Self::Unavailable {
                message: e.user_message().to_string(),
                retriable: e.is_retriable(),
            },
        }
    }
}

impl From<DomainError> for ProductReviewsError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Api(err) => err.into(),
            DomainError::Validation { field, message } => {
                Self::validation(format!("{field}: {message}"))
            }
            DomainError::BatchFailed { summary, .. } => Self::PartialFailure { summary },
            DomainError::Busy { operation } => Self::Busy {
                operation: operation.to_string(),
            },
            DomainError::Storage { message } => Self::Internal { message },
        }
    }
}
