//! Cart Pricing
//!
//! Turns a request-scoped cart into the line items sent to the payment
//! provider. Carts are never persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{Result, StorefrontError};

/// A product reference in a cart
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub id: String,
}

/// Cart submitted at checkout
///
/// A resolvable `bundle_id` takes precedence over `items`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub bundle_id: Option<String>,

    #[serde(default)]
    pub items: Vec<CartItem>,

    #[serde(default)]
    pub email: Option<String>,
}

/// One priced entry of a checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog id, carried through the provider for reconciliation
    pub catalog_id: String,

    /// Display name shown on the hosted payment page
    pub name: String,

    /// Unit price in minor units
    pub unit_amount: i64,

    pub quantity: u64,
}

impl From<&CatalogEntry> for LineItem {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            catalog_id: entry.id.clone(),
            name: entry.name.clone(),
            unit_amount: entry.unit_amount,
            quantity: 1,
        }
    }
}

impl Cart {
    /// Cart holding a single bundle
    pub fn bundle(id: impl Into<String>) -> Self {
        Self {
            bundle_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Cart holding the given product ids
    pub fn products<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: ids.into_iter().map(|id| CartItem { id: id.into() }).collect(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Customer email, if a non-blank one was given
    pub fn customer_email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// Price the cart against the catalog
    ///
    /// Duplicate product ids collapse to one line item and unknown ids are
    /// dropped. Fails when nothing billable remains.
    pub fn line_items(&self, catalog: &Catalog) -> Result<Vec<LineItem>> {
        if let Some(bundle) = self.bundle_id.as_deref().and_then(|id| catalog.bundle(id)) {
            return Ok(vec![LineItem::from(bundle)]);
        }

        let mut seen = HashSet::new();
        let line_items: Vec<LineItem> = self
            .items
            .iter()
            .filter(|item| seen.insert(item.id.as_str()))
            .filter_map(|item| {
                let product = catalog.product(&item.id);
                if product.is_none() {
                    tracing::debug!(product_id = %item.id, "Dropping unknown product from cart");
                }
                product
            })
            .map(LineItem::from)
            .collect();

        if line_items.is_empty() {
            return Err(StorefrontError::Validation("No items selected".into()));
        }

        Ok(line_items)
    }
}
