//! Error Types

use thiserror::Error;

/// Result type alias for storefront operations
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Storefront error types
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Missing or empty required input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catalog definition is inconsistent
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Persistence layer unavailable or write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorefrontError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Storage(_) => "Database error".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
