//! HTTP client error types

use super::FieldValidationError;

/// Errors returned by the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-2xx response from the API.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
        /// Per-field validation failures, if any.
        fields: Vec<FieldValidationError>,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Per-field validation failures carried by a 400 response.
    pub fn fields(&self) -> &[FieldValidationError] {
        match self {
            Self::Http { fields, .. } => fields,
            _ => &[],
        }
    }
}
