//! Response envelope shared by every remote endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `{success, data, message}` wrapper around every API response.
///
/// Bodies that do not match this shape fail to decode; they are never
/// reinterpreted as bare payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Why an envelope could not be unwrapped into its payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The server reported `success: false`.
    #[error("{}", .0.as_deref().unwrap_or("Request was rejected"))]
    Rejected(Option<String>),

    /// The server reported success but sent no `data`.
    #[error("Response is missing data")]
    MissingData,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Unwraps the payload of a successful response.
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        if !self.success {
            return Err(EnvelopeError::Rejected(self.message));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }

    /// Unwraps a response whose payload is irrelevant, returning the message.
    pub fn into_ack(self) -> Result<Option<String>, EnvelopeError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(EnvelopeError::Rejected(self.message))
        }
    }
}
