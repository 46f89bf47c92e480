//! Closed error taxonomy for everything that crosses the network boundary.
//!
//! Repositories and HTTP adapters convert transport failures into [`FwError`]
//! so callers only ever branch on an [`ErrorKind`].

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Canonical error kinds, each with a stable code and retriable flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Network,
    Timeout,
    NoInternet,
    ServerError,
    ClientError,
    NotFound,
    RateLimited,
    Decoding,
    Unauthorized,
    Forbidden,
    Unknown,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Network => "NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::NoInternet => "NO_INTERNET",
            Self::ServerError => "SERVER_ERROR",
            Self::ClientError => "CLIENT_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Decoding => "DECODING",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub const fn is_retriable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::NoInternet | Self::ServerError | Self::RateLimited
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Framework error: kind + human-readable message (+ HTTP status when known).
///
/// Cloneable so it can live inside published UI state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FwError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

pub type FwResult<T> = Result<T, FwError>;

impl FwError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "Request timed out")
    }

    pub fn no_internet() -> Self {
        Self::new(ErrorKind::NoInternet, "No internet connection")
    }

    pub fn server_error(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::with_optional_status(ErrorKind::ServerError, message.into(), status)
    }

    pub fn client_error(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::with_optional_status(ErrorKind::ClientError, message.into(), status)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited, "Rate limited, please try again later")
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decoding, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden, "Forbidden")
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    fn with_optional_status(kind: ErrorKind, message: String, status: Option<u16>) -> Self {
        match status {
            Some(code) => Self::new(kind, format!("{message} (HTTP {code})")).with_status(code),
            None => Self::new(kind, message),
        }
    }

    /// Deterministic HTTP status mapping.
    pub fn from_status(status: u16, message: Option<&str>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP error {status}"));
        let err = match status {
            401 => Self::new(ErrorKind::Unauthorized, message),
            403 => Self::new(ErrorKind::Forbidden, message),
            404 => Self::new(ErrorKind::NotFound, message),
            429 => Self::new(ErrorKind::RateLimited, message),
            400..=499 => return Self::client_error(message, Some(status)),
            500..=599 => return Self::server_error(message, Some(status)),
            _ => Self::new(ErrorKind::Unknown, message),
        };
        err.with_status(status)
    }

    /// Map a non-success response body. Uses the backend's `message` field when present.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        Self::from_status(status, parsed.as_ref().and_then(|b| b.message.as_deref()))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    /// Short text suitable for an inline banner or toast.
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            ErrorKind::InvalidArgument | ErrorKind::ClientError => {
                "Invalid request. Please try again."
            }
            ErrorKind::Network => "Connection failed. Please check your internet.",
            ErrorKind::Timeout => "Request timed out. Please try again.",
            ErrorKind::NoInternet => {
                "No internet connection. Please check your network settings."
            }
            ErrorKind::ServerError => "Server is temporarily unavailable. Please try later.",
            ErrorKind::NotFound => "Content not found.",
            ErrorKind::RateLimited => "Too many requests. Please wait a moment.",
            ErrorKind::Decoding => "Unable to process server response. Please try again.",
            ErrorKind::Unauthorized => "Session expired. Please restart the app.",
            ErrorKind::Forbidden => "Access denied.",
            ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }
}

/// Error body produced by the backend's exception handler.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl From<reqwest::Error> for FwError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::timeout();
        }
        if let Some(status) = e.status() {
            return Self::from_status(status.as_u16(), None);
        }
        if e.is_connect() {
            return Self::network("Connection failed");
        }
        if e.is_decode() {
            return Self::decoding(format!("Serialization error: {e}"));
        }
        if e.is_builder() {
            return Self::invalid_argument(format!("Invalid request: {e}"));
        }
        Self::network(format!("I/O error: {e}"))
    }
}

impl From<serde_json::Error> for FwError {
    fn from(e: serde_json::Error) -> Self {
        Self::decoding(format!("Serialization error: {e}"))
    }
}

impl From<std::io::Error> for FwError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => Self::timeout(),
            _ => Self::network(format!("I/O error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_deterministic() {
        assert_eq!(FwError::from_status(401, None).kind(), ErrorKind::Unauthorized);
        assert_eq!(FwError::from_status(403, None).kind(), ErrorKind::Forbidden);
        assert_eq!(FwError::from_status(404, None).kind(), ErrorKind::NotFound);
        assert_eq!(FwError::from_status(429, None).kind(), ErrorKind::RateLimited);
        assert_eq!(FwError::from_status(400, None).kind(), ErrorKind::ClientError);
        assert_eq!(FwError::from_status(422, None).kind(), ErrorKind::ClientError);
        assert_eq!(FwError::from_status(500, None).kind(), ErrorKind::ServerError);
        assert_eq!(FwError::from_status(503, None).kind(), ErrorKind::ServerError);
        assert_eq!(FwError::from_status(302, None).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn status_is_kept_and_appended_for_client_and_server_errors() {
        let err = FwError::from_status(502, Some("Bad gateway"));
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.message(), "Bad gateway (HTTP 502)");

        let err = FwError::from_status(404, None);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "HTTP error 404");
    }

    #[test]
    fn retriable_flags_follow_kind() {
        for kind in [
            ErrorKind::Network,
            ErrorKind::Timeout,
            ErrorKind::NoInternet,
            ErrorKind::ServerError,
            ErrorKind::RateLimited,
        ] {
            assert!(kind.is_retriable(), "{kind} should be retriable");
        }
        for kind in [
            ErrorKind::InvalidArgument,
            ErrorKind::ClientError,
            ErrorKind::NotFound,
            ErrorKind::Decoding,
            ErrorKind::Unauthorized,
            ErrorKind::Forbidden,
            ErrorKind::Unknown,
        ] {
            assert!(!kind.is_retriable(), "{kind} should not be retriable");
        }
    }

    #[test]
    fn response_body_message_is_used() {
        let err = FwError::from_response_body(
            404,
            r#"{"timestamp":"2024-01-01T00:00:00","code":404,"message":"Product not found"}"#,
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "Product not found");

        let err = FwError::from_response_body(500, "<html>oops</html>");
        assert_eq!(err.message(), "HTTP error 500 (HTTP 500)");
    }

    #[test]
    fn display_includes_code() {
        let err = FwError::invalid_argument("Already loading");
        assert_eq!(err.to_string(), "INVALID_ARGUMENT: Already loading");
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn serde_errors_become_decoding() {
        let e = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(FwError::from(e).kind(), ErrorKind::Decoding);
    }
}
