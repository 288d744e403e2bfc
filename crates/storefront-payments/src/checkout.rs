//! Stripe Checkout Integration
//!
//! Implements `PaymentProvider` on top of Stripe Checkout (Hosted).

use async_trait::async_trait;
use std::collections::HashMap;
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionId, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionPaymentMethodTypes, Currency,
};

use crate::error::{PaymentError, Result};
use crate::provider::{
    CATALOG_ID_KEY, CATALOG_IDS_KEY, CheckoutRequest, CheckoutSession, PaymentProvider,
    PaymentStatus, SessionSnapshot, decode_catalog_ids, encode_catalog_ids,
};

/// Currency all catalog prices are charged in
const CURRENCY: Currency = Currency::GBP;

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    fn line_items(request: &CheckoutRequest) -> Vec<CreateCheckoutSessionLineItems> {
        request
            .line_items
            .iter()
            .map(|item| {
                let mut metadata = HashMap::new();
                metadata.insert(CATALOG_ID_KEY.to_string(), item.catalog_id.clone());

                CreateCheckoutSessionLineItems {
                    quantity: Some(item.quantity),
                    price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                        currency: CURRENCY,
                        unit_amount: Some(item.unit_amount),
                        product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                            name: item.name.clone(),
                            metadata: Some(metadata),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
            })
            .collect()
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    /// Create a Stripe Checkout session in payment mode
    ///
    /// The purchased catalog ids travel in session metadata so verification
    /// can resolve downloads without matching on display names.
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.customer_email = request.customer_email.as_deref();
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);

        let mut metadata = HashMap::new();
        metadata.insert(CATALOG_IDS_KEY.to_string(), encode_catalog_ids(&request.line_items));
        params.metadata = Some(metadata);

        params.line_items = Some(Self::line_items(request));

        let session = StripeCheckoutSession::create(&self.client, params).await?;

        let checkout_url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            checkout_url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionSnapshot> {
        let id = session_id
            .parse::<CheckoutSessionId>()
            .map_err(|e| PaymentError::Validation(format!("Invalid session ID: {e}")))?;

        let session = StripeCheckoutSession::retrieve(&self.client, &id, &["line_items"]).await?;

        let catalog_ids = session
            .metadata
            .as_ref()
            .and_then(|m| m.get(CATALOG_IDS_KEY))
            .map(|ids| decode_catalog_ids(ids))
            .unwrap_or_default();

        let descriptions = session
            .line_items
            .map(|list| {
                list.data
                    .into_iter()
                    .filter_map(|item| Option::<String>::from(item.description))
                    .collect()
            })
            .unwrap_or_default();

        Ok(SessionSnapshot {
            id: session.id.to_string(),
            payment_status: PaymentStatus::from_provider(session.payment_status.as_str()),
            customer_email: session
                .customer_details
                .and_then(|details| details.email)
                .or(session.customer_email),
            amount_total: session.amount_total.unwrap_or_default(),
            descriptions,
            catalog_ids,
        })
    }

    fn name(&self) -> &str {
        "stripe"
    }
}
