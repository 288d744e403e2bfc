//! HTTP Handlers

use axum::{
    Json,
    extract::{FromRequest, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use storefront_core::{Cart, CallRequestForm};
use storefront_payments::{DownloadDescriptor, PaymentError, Verification};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

/// JSON body whose rejections answer with the `{error, code}` body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySessionRequest {
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    pub success: bool,
    pub items: Vec<DownloadDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct NotVerifiedResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /`
pub async fn liveness() -> &'static str {
    "🚀 Backend is live"
}

/// `POST /create-checkout-session`
pub async fn create_checkout_session(
    State(state): State<AppState>,
    ApiJson(cart): ApiJson<Cart>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let session = state.checkout()?.start_checkout(&cart).await.map_err(|e| {
        if !matches!(e, PaymentError::Validation(_)) {
            tracing::error!(error = %e, "Checkout session creation failed");
        }
        ApiError::from(e)
    })?;

    Ok(Json(CheckoutResponse {
        url: session.checkout_url,
    }))
}

/// Verification failures keep provider and storage detail out of the body
fn verification_error(err: PaymentError, session_id: &str) -> ApiError {
    match err {
        PaymentError::Validation(msg) => ApiError::Validation(msg),
        PaymentError::Stripe(_) => {
            tracing::error!(session_id = %session_id, error = %err, "Session retrieval failed");
            ApiError::Upstream("Verification failed".into())
        }
        PaymentError::Storage(_) => {
            tracing::error!(session_id = %session_id, error = %err, "Order recording failed");
            ApiError::Persistence("Verification failed".into())
        }
        PaymentError::Config(_) | PaymentError::LinkRejected(_) => {
            tracing::error!(session_id = %session_id, error = %err, "Download link construction failed");
            ApiError::Internal("Verification failed".into())
        }
    }
}

/// `POST /api/verify-session`
pub async fn verify_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifySessionRequest>,
) -> Result<Response, ApiError> {
    let verification = state
        .checkout()?
        .verify_session(&request.session_id)
        .await
        .map_err(|e| verification_error(e, &request.session_id))?;

    let response = match verification {
        Verification::NotPaid { .. } => (
            StatusCode::BAD_REQUEST,
            Json(NotVerifiedResponse {
                success: false,
                message: "Payment not verified".into(),
            }),
        )
            .into_response(),
        Verification::Paid { downloads, .. } => Json(VerifySessionResponse {
            success: true,
            items: downloads,
        })
        .into_response(),
    };

    Ok(response)
}

/// `POST /api/request-call`
pub async fn request_call(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<CallRequestForm>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let call_request = form.validate(state.call_policy)?;

    state
        .call_requests
        .record_call_request(&call_request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to save call request");
            ApiError::from(e)
        })?;

    tracing::info!(
        email = %call_request.email,
        company = ?call_request.company,
        "Recorded call request"
    );

    Ok(Json(SuccessResponse { success: true }))
}
