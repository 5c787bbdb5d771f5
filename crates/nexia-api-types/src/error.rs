//! Error types for backend calls.

use thiserror::Error;

/// Failures talking to the backend.
///
/// `Unreachable` is the "could not reach server" case and is kept apart from
/// `Status`, where the server answered but reported a failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Could not reach the server at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from server: {message}")]
    Decode { message: String },

    #[error("Invalid client configuration: {message}")]
    Config { message: String },
}

impl ApiError {
    pub fn unreachable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Result type for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;
