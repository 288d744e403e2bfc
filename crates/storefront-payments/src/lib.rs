//! # storefront-payments
//!
//! Payment processing and fulfillment for the storefront.
//!
//! ## Stripe Checkout (Hosted)
//!
//! **Flow:** Cart → Redirect to Stripe's hosted page → Redirect back with the
//! session id → verify → download.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────────────┐
//! │  Storefront │────▶│  Stripe Hosted  │────▶│  /success?session_id │
//! │   (cart)    │     │  Checkout Page  │     │  → verify-session    │
//! └─────────────┘     └─────────────────┘     └─────────────────────┘
//! ```
//!
//! Verification is idempotent: the order for a session is written through an
//! atomic insert-if-absent, so retries and concurrent callbacks store one
//! order.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_payments::{CheckoutService, DownloadLinks, RedirectUrls, StripeClient};
//!
//! let service = CheckoutService::new(
//!     catalog,
//!     Arc::new(StripeClient::new("sk_test_xxx")),
//!     orders,
//!     DownloadLinks::new("https://api.example.com")?,
//!     RedirectUrls::for_frontend("https://shop.example.com"),
//! );
//!
//! let session = service.start_checkout(&cart).await?;
//! // Redirect customer to: session.checkout_url
//! ```

mod checkout;
mod error;
mod links;
pub mod provider;
mod service;

pub use checkout::StripeClient;
pub use error::{PaymentError, Result};
pub use links::{DEFAULT_LINK_TTL_SECS, DownloadLinks, LinkSigner};
pub use provider::{
    CheckoutRequest, CheckoutSession, MockPaymentProvider, PaymentProvider, PaymentStatus,
    SessionSnapshot,
};
pub use service::{CheckoutService, DownloadDescriptor, RedirectUrls, Verification};
