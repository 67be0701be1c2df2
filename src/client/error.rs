use http::StatusCode;
use thiserror::Error;

/// Failure of a single call against the journal API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The server could not be reached at all.
    #[error("connection error: {0}")]
    Connectivity(String),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}{}", .message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Remote {
        status: StatusCode,
        message: Option<String>,
    },

    /// Get-by-date found nothing for the requested date.
    #[error("no entry for this date")]
    NotFound,

    /// A 2xx response whose body was not what we expected.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl StoreError {
    /// Human readable text provided by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            StoreError::Remote { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }
}
