//! Stored document shapes
//!
//! Field names match the existing `orders` and `callRequests` data.

use bson::DateTime as BsonDateTime;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use storefront_core::catalog::minor_units;
use storefront_core::{CallRequest, Order};

/// `orders` collection document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    /// Checkout session id; unique index
    #[serde(rename = "orderId")]
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Major units, kept for existing readers
    pub amount: f64,

    /// Exact minor units; absent on legacy documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_minor: Option<i64>,

    pub items: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog_ids: Vec<String>,

    pub created_at: BsonDateTime,
}

impl From<&Order> for OrderDocument {
    fn from(order: &Order) -> Self {
        Self {
            session_id: order.session_id.clone(),
            email: order.email.clone(),
            amount: order.amount().to_f64().unwrap_or_default(),
            amount_minor: Some(order.amount_minor),
            items: order.items.clone(),
            catalog_ids: order.catalog_ids.clone(),
            created_at: BsonDateTime::from_chrono(order.created_at),
        }
    }
}

impl From<OrderDocument> for Order {
    fn from(doc: OrderDocument) -> Self {
        let amount_minor = doc.amount_minor.unwrap_or_else(|| {
            Decimal::from_f64(doc.amount)
                .and_then(minor_units)
                .unwrap_or_default()
        });

        Self {
            session_id: doc.session_id,
            email: doc.email,
            amount_minor,
            items: doc.items,
            catalog_ids: doc.catalog_ids,
            created_at: doc.created_at.to_chrono(),
        }
    }
}

/// `callRequests` collection document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequestDocument {
    pub name: String,
    pub email: String,
    pub goals: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    pub created_at: BsonDateTime,
}

impl From<&CallRequest> for CallRequestDocument {
    fn from(request: &CallRequest) -> Self {
        Self {
            name: request.name.clone(),
            email: request.email.clone(),
            goals: request.goals.clone(),
            company: request.company.clone(),
            created_at: BsonDateTime::from_chrono(request.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::{TimeZone, Utc};

    fn order() -> Order {
        Order {
            session_id: "cs_test_a1".into(),
            email: Some("buyer@example.com".into()),
            amount_minor: 10900,
            items: vec!["Sales Excellence Series (3 Books)".into()],
            catalog_ids: vec!["sales-series".into()],
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_order_document_fields() {
        let document = bson::to_document(&OrderDocument::from(&order())).unwrap();

        assert_eq!(document.get_str("orderId").unwrap(), "cs_test_a1");
        assert_eq!(document.get_f64("amount").unwrap(), 109.0);
        assert_eq!(document.get_i64("amountMinor").unwrap(), 10900);
        assert!(document.get_datetime("createdAt").is_ok());
    }

    #[test]
    fn test_order_document_back_to_order() {
        let restored = Order::from(OrderDocument::from(&order()));
        assert_eq!(restored, order());
    }

    #[test]
    fn test_legacy_order_document() {
        let legacy = doc! {
            "orderId": "cs_live_legacy",
            "email": "old@example.com",
            "amount": 69.99,
            "items": ["SDR Success Playbook"],
            "createdAt": BsonDateTime::now(),
        };

        let order = Order::from(bson::from_document::<OrderDocument>(legacy).unwrap());
        assert_eq!(order.amount_minor, 6999);
        assert!(order.catalog_ids.is_empty());
    }

    #[test]
    fn test_call_request_without_company() {
        let request = CallRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            goals: "Build a sales team".into(),
            company: None,
            created_at: Utc::now(),
        };

        let document = bson::to_document(&CallRequestDocument::from(&request)).unwrap();
        assert!(!document.contains_key("company"));
        assert_eq!(document.get_str("goals").unwrap(), "Build a sales team");
    }
}
