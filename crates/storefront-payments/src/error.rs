//! Payment Error Types

use storefront_core::StorefrontError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Caller-fixable input problem (empty cart, malformed session id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Download link missing, expired or tampered with
    #[error("Download link rejected: {0}")]
    LinkRejected(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Stripe(_) | Self::Storage(_))
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            Self::Stripe(_) => "Payment processing failed. Please try again.",
            Self::Validation(msg) => msg,
            Self::LinkRejected(_) => "This download link is invalid or has expired.",
            Self::Config(_) => "Service configuration error.",
            Self::Storage(_) => "Database error",
        }
    }
}

impl From<StorefrontError> for PaymentError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::Validation(msg) => Self::Validation(msg),
            StorefrontError::Catalog(msg) => Self::Config(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<stripe::StripeError> for PaymentError {
    fn from(err: stripe::StripeError) -> Self {
        Self::Stripe(err.to_string())
    }
}
