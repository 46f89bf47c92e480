use fwkit::FwError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error(transparent)]
    Api(#[from] FwError),

    #[error("Validation failed for {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// A batch was rolled back; `summary` lists what failed.
    #[error("{summary}")]
    BatchFailed { summary: String, source: FwError },

    #[error("{operation} is already in progress")]
    Busy { operation: &'static str },

    #[error("Preference storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Underlying network error, if any.
    pub fn api_error(&self) -> Option<&FwError> {
        match self {
            Self::Api(e) | Self::BatchFailed { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
