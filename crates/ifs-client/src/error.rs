//! Error types for the client library.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Fallback message when a failed response carries no `message`.
pub const GENERIC_FAILURE_MESSAGE: &str = "API request failed";

/// Errors that can occur when talking to the IFS API.
///
/// Every variant reports an HTTP status through [`ClientError::http_status`]
/// (0 when no response was received) and an optional context map through
/// [`ClientError::context`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The bearer token could not be obtained.
    ///
    /// Raised before any API call is attempted. `status` is the token
    /// endpoint's status code, or 0 when it could not be reached.
    #[error("OAuth token request failed: {message}")]
    TokenAcquisitionFailed {
        /// What went wrong.
        message: String,
        /// Token endpoint status code, 0 for transport failures.
        status: u16,
        /// Underlying transport error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// No response was received: connection error, DNS failure or timeout.
    #[error("HTTP request failed: {message}")]
    TransportFailure {
        /// What went wrong.
        message: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a status outside `200..300`.
    ///
    /// `context` holds the raw response body under `"response"`.
    #[error("{message} (HTTP {status})")]
    RequestFailed {
        /// The response's `message` field or a generic fallback.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Extra detail about the failure.
        context: Map<String, Value>,
    },

    /// Client configuration issue.
    ///
    /// Invalid base URL, missing credentials, or an unbuildable HTTP client.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// JSON serialization of a request body failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A successful response did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ClientError::TokenAcquisitionFailed`].
    TokenAcquisitionFailed,
    /// See [`ClientError::TransportFailure`].
    TransportFailure,
    /// See [`ClientError::RequestFailed`].
    RequestFailed,
    /// See [`ClientError::ConfigurationError`].
    Configuration,
    /// See [`ClientError::SerializationError`].
    Serialization,
    /// See [`ClientError::InvalidResponse`].
    InvalidResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TokenAcquisitionFailed => "TokenAcquisitionFailed",
            Self::TransportFailure => "TransportFailure",
            Self::RequestFailed => "RequestFailed",
            Self::Configuration => "Configuration",
            Self::Serialization => "Serialization",
            Self::InvalidResponse => "InvalidResponse",
        };
        f.write_str(name)
    }
}

impl ClientError {
    /// The error's kind.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TokenAcquisitionFailed { .. } => ErrorKind::TokenAcquisitionFailed,
            Self::TransportFailure { .. } => ErrorKind::TransportFailure,
            Self::RequestFailed { .. } => ErrorKind::RequestFailed,
            Self::ConfigurationError(_) => ErrorKind::Configuration,
            Self::SerializationError(_) => ErrorKind::Serialization,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }

    /// The originating HTTP status, or 0 when no response was involved.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::TokenAcquisitionFailed { status, .. } | Self::RequestFailed { status, .. } => {
                *status
            }
            _ => 0,
        }
    }

    /// Extra detail about a failed request, such as the raw response body.
    pub const fn context(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::RequestFailed { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The raw body of a failed response, if one was received.
    pub fn response_body(&self) -> Option<&Value> {
        self.context().and_then(|context| context.get("response"))
    }

    /// Check if this error is potentially retryable by the caller.
    ///
    /// Returns `true` for transport failures, token endpoint outages, rate
    /// limiting and 5xx responses. The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportFailure { .. } => true,
            Self::TokenAcquisitionFailed { status, .. } => *status == 0 || *status >= 500,
            Self::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if this error was caused by a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::TransportFailure { source, .. } => source.is_timeout(),
            Self::TokenAcquisitionFailed {
                source: Some(source),
                ..
            } => source.is_timeout(),
            _ => false,
        }
    }

    /// Check if this is an authentication error.
    pub const fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::TokenAcquisitionFailed { .. } | Self::RequestFailed { status: 401, .. }
        )
    }
}
