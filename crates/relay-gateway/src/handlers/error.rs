//! Handler error types

use relay_service::{ErrorBody, SendFailure, SendStage, ServiceError};
use thiserror::Error;

use crate::protocol::{FrameError, PayloadError};

/// Handler error type
///
/// Every variant is reported to the originating session only.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame or payload could not be decoded
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Session may not act as the requested user
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Message pipeline failure
    #[error(transparent)]
    Send(#[from] SendFailure),

    /// Reply payload could not be encoded
    #[error("Failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HandlerError {
    /// Pipeline stage the failure is attributed to
    pub fn stage(&self) -> SendStage {
        match self {
            Self::InvalidPayload(_) | Self::Encode(_) => SendStage::Validate,
            Self::Unauthorized(_) => SendStage::Authorize,
            Self::Send(failure) => failure.stage,
        }
    }

    /// Error object sent back to the caller
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::InvalidPayload(msg) => {
                ErrorBody::new(SendStage::Validate, &ServiceError::validation(msg.as_str()))
            }
            Self::Unauthorized(msg) => {
                ErrorBody::new(SendStage::Authorize, &ServiceError::authorization(msg.as_str()))
            }
            Self::Send(failure) => failure.body(),
            Self::Encode(e) => {
                ErrorBody::new(SendStage::Validate, &ServiceError::internal(e.to_string()))
            }
        }
    }
}

impl From<PayloadError> for HandlerError {
    fn from(err: PayloadError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

impl From<FrameError> for HandlerError {
    fn from(err: FrameError) -> Self {
        Self::InvalidPayload(err.reason)
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
