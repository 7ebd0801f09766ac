//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use relay_core::DomainError;
use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed or missing input
    Validation(String),

    /// Caller may not perform the operation
    Authorization(String),

    /// Store call failed
    Persistence(String),

    /// Store call exceeded its deadline
    Timeout { operation: &'static str },

    /// Domain rule violation
    Domain(DomainError),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Authorization(msg) => write!(f, "Not authorized: {msg}"),
            Self::Persistence(msg) => write!(f, "Store error: {msg}"),
            Self::Timeout { operation } => write!(f, "Store call timed out: {operation}"),
            Self::Domain(e) => write!(f, "{e}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an authorization error
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create a store timeout error
    pub fn timeout(operation: &'static str) -> Self {
        Self::Timeout { operation }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify an error coming back from a repository
    pub fn from_store(err: DomainError) -> Self {
        if err.is_infrastructure() {
            Self::Persistence(err.to_string())
        } else {
            Self::Domain(err)
        }
    }

    /// Get the error code for acknowledgements and `error` events
    pub fn error_code(&self) -> &str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authorization(_) => "AUTHORIZATION_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Timeout { .. } => "STORE_TIMEOUT",
            Self::Domain(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Persistence(_) | Self::Timeout { .. } => true,
            Self::Domain(e) => e.is_infrastructure(),
            _ => false,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
