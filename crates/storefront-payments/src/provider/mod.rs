//! Payment Provider Strategy Pattern
//!
//! Hosted-checkout providers create a payment session for a set of line
//! items and later report whether that session was paid. The storefront only
//! ever holds the provider's opaque session id.

mod mock;

pub use mock::MockPaymentProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::LineItem;

use crate::error::Result;

/// Session metadata key carrying the purchased catalog ids
pub const CATALOG_IDS_KEY: &str = "catalog_ids";

/// Line-item product metadata key carrying a single catalog id
pub const CATALOG_ID_KEY: &str = "catalog_id";

/// Request to create a hosted checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub line_items: Vec<LineItem>,

    /// Customer email, prefilled on the hosted page
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Redirect after payment; may contain the provider's session id placeholder
    pub success_url: String,

    /// Redirect if checkout is abandoned
    pub cancel_url: String,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session ID
    pub id: String,

    /// URL to redirect the customer to
    pub checkout_url: String,
}

/// Payment state of a session as reported by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl PaymentStatus {
    pub fn from_provider(status: &str) -> Self {
        match status {
            "paid" => Self::Paid,
            "no_payment_required" => Self::NoPaymentRequired,
            _ => Self::Unpaid,
        }
    }

    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// Retrieved state of a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub payment_status: PaymentStatus,

    /// Email the customer paid with
    pub customer_email: Option<String>,

    /// Total charged in minor units
    pub amount_total: i64,

    /// Line-item descriptions, in line-item order
    pub descriptions: Vec<String>,

    /// Catalog ids from session metadata; empty for sessions created without it
    #[serde(default)]
    pub catalog_ids: Vec<String>,
}

/// Hosted payment provider trait
///
/// Implement this for each processor. `StripeClient` is the production one.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a single-payment checkout session
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;

    /// Retrieve a session including its line items
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionSnapshot>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Encode catalog ids for session metadata
pub fn encode_catalog_ids(line_items: &[LineItem]) -> String {
    line_items
        .iter()
        .map(|item| item.catalog_id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode catalog ids from session metadata
pub fn decode_catalog_ids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_metadata() {
        let items = vec![
            LineItem {
                catalog_id: "ebook-sdr".into(),
                name: "SDR Success Playbook".into(),
                unit_amount: 6900,
                quantity: 1,
            },
            LineItem {
                catalog_id: "ebook-bdm".into(),
                name: "Business Development Playbook".into(),
                unit_amount: 6900,
                quantity: 1,
            },
        ];

        let encoded = encode_catalog_ids(&items);
        assert_eq!(encoded, "ebook-sdr,ebook-bdm");
        assert_eq!(decode_catalog_ids(&encoded), ["ebook-sdr", "ebook-bdm"]);
        assert!(decode_catalog_ids(" , ").is_empty());
    }

    #[test]
    fn test_payment_status() {
        assert!(PaymentStatus::from_provider("paid").is_paid());
        assert!(!PaymentStatus::from_provider("unpaid").is_paid());
        assert!(!PaymentStatus::from_provider("no_payment_required").is_paid());
    }
}
