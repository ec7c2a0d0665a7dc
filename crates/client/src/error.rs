//! Client error types.

use domain::models::user::UserRequestError;
use domain::models::EnvelopeError;
use domain::services::GatewayError;
use thiserror::Error;

/// Errors that can occur while talking to the remote API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Administrator access required")]
    AdminRequired,

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer. `message` is the server's reason when the body had one.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Well-formed envelope with `success: false`.
    #[error("{}", .0.as_deref().unwrap_or("Request was rejected"))]
    Rejected(Option<String>),

    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Request(#[from] UserRequestError),
}

impl ClientError {
    /// The reason given by the server, if it gave one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected(message) | ClientError::Status { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }
}

impl From<EnvelopeError> for ClientError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Rejected(message) => ClientError::Rejected(message),
            EnvelopeError::MissingData => ClientError::InvalidResponse(err.to_string()),
        }
    }
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Rejected(message) => GatewayError::Rejected(message),
            ClientError::Status {
                message: Some(message),
                ..
            } => GatewayError::Rejected(Some(message)),
            other => GatewayError::Transport(other.to_string()),
        }
    }
}
