use crate::domain::intent::PaymentProvider;
use thiserror::Error;

/// Error taxonomy for the payments core. Transport-level mapping happens at
/// the HTTP boundary only.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("circuit open for provider {provider}")]
    CircuitOpen { provider: PaymentProvider },

    #[error("upstream {provider} failure on {operation}: {message}")]
    Upstream {
        provider: PaymentProvider,
        operation: String,
        status: Option<u16>,
        message: String,
    },

    #[error("invalid webhook signature")]
    SignatureInvalid,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        PaymentError::Internal(err.into())
    }
}

impl From<redis::RedisError> for PaymentError {
    fn from(err: redis::RedisError) -> Self {
        PaymentError::Internal(err.into())
    }
}

impl PaymentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PaymentError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        PaymentError::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        PaymentError::Conflict(msg.into())
    }
}
