//! API Errors
//!
//! Maps domain errors onto HTTP status codes and the `{error, code}` body.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use storefront_core::StorefrontError;
use storefront_payments::PaymentError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or empty required input
    #[error("{0}")]
    Validation(String),

    /// Payment provider call failed
    #[error("{0}")]
    Upstream(String),

    /// Store unavailable or write failed
    #[error("{0}")]
    Persistence(String),

    /// Requested file absent
    #[error("{0}")]
    NotFound(String),

    /// Download link missing, expired or tampered with
    #[error("{0}")]
    Forbidden(String),

    /// Payments are not configured on this instance
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) | Self::Persistence(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unavailable(_) => "PAYMENTS_DISABLED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().into(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(msg) => Self::Validation(msg),
            PaymentError::Stripe(msg) => Self::Upstream(msg),
            PaymentError::Storage(_) => Self::Persistence(err.user_message().into()),
            PaymentError::LinkRejected(_) => Self::Forbidden(err.user_message().into()),
            PaymentError::Config(_) => Self::Internal(err.user_message().into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::Validation("Invalid request body".into())
    }
}

impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::Validation(msg) => Self::Validation(msg),
            StorefrontError::Storage(_) => Self::Persistence(err.user_message()),
            _ => Self::Internal(err.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(PaymentError::Validation("No items selected".into())), StatusCode::BAD_REQUEST),
            (ApiError::from(PaymentError::Stripe("card_declined".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(PaymentError::Storage("timeout".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(PaymentError::LinkRejected("expired".into())), StatusCode::FORBIDDEN),
            (ApiError::from(StorefrontError::Validation("Missing fields".into())), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("File not found.".into()), StatusCode::NOT_FOUND),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error:?}");
        }
    }

    #[test]
    fn test_provider_message_preserved() {
        let error = ApiError::from(PaymentError::Stripe("Invalid API Key provided".into()));
        assert_eq!(error.to_string(), "Invalid API Key provided");
        assert_eq!(error.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_storage_detail_hidden() {
        let error = ApiError::from(StorefrontError::Storage("auth failed for user shop".into()));
        assert_eq!(error.to_string(), "Database error");
    }
}
