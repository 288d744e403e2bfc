//! Checkout and Fulfillment
//!
//! Starts hosted checkout sessions for a cart and reconciles paid sessions
//! back into orders and download links.
//!
//! ```text
//! Cart ──▶ start_checkout ──▶ provider session ──▶ customer pays
//!                                                        │
//! downloads ◀── record order (once) ◀── verify_session ◀─┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use storefront_core::{Cart, Catalog, CatalogEntry, Order, OrderOutcome, OrderStore};

use crate::error::{PaymentError, Result};
use crate::links::DownloadLinks;
use crate::provider::{CheckoutRequest, CheckoutSession, PaymentProvider, PaymentStatus, SessionSnapshot};

/// Provider-side redirect targets
#[derive(Clone, Debug)]
pub struct RedirectUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl RedirectUrls {
    /// Success and cancel pages of the storefront frontend
    ///
    /// The success URL carries Stripe's session id placeholder so the
    /// frontend can call back with it.
    pub fn for_frontend(frontend_url: &str) -> Self {
        let base = frontend_url.trim_end_matches('/');
        Self {
            success_url: format!("{base}/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{base}/cart"),
        }
    }
}

/// A purchased file the customer may fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDescriptor {
    pub name: String,
    pub download_url: String,
}

/// Outcome of verifying a checkout session
#[derive(Clone, Debug)]
pub enum Verification {
    /// Not paid (yet); nothing was persisted
    NotPaid { status: PaymentStatus },

    /// Paid; the order exists and downloads are available
    Paid {
        outcome: OrderOutcome,
        downloads: Vec<DownloadDescriptor>,
    },
}

/// Checkout initiation and payment reconciliation
pub struct CheckoutService {
    catalog: Arc<Catalog>,
    provider: Arc<dyn PaymentProvider>,
    orders: Arc<dyn OrderStore>,
    links: DownloadLinks,
    redirects: RedirectUrls,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<Catalog>,
        provider: Arc<dyn PaymentProvider>,
        orders: Arc<dyn OrderStore>,
        links: DownloadLinks,
        redirects: RedirectUrls,
    ) -> Self {
        Self {
            catalog,
            provider,
            orders,
            links,
            redirects,
        }
    }

    pub fn links(&self) -> &DownloadLinks {
        &self.links
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Price the cart and open a hosted checkout session
    ///
    /// An empty cart fails validation before the provider is contacted.
    pub async fn start_checkout(&self, cart: &Cart) -> Result<CheckoutSession> {
        let line_items = cart.line_items(&self.catalog)?;

        let request = CheckoutRequest {
            line_items,
            customer_email: cart.customer_email().map(str::to_string),
            success_url: self.redirects.success_url.clone(),
            cancel_url: self.redirects.cancel_url.clone(),
        };

        let session = self.provider.create_session(&request).await?;

        tracing::info!(
            session_id = %session.id,
            provider = self.provider.name(),
            line_items = request.line_items.len(),
            "Created checkout session"
        );

        Ok(session)
    }

    /// Confirm payment, record the order once, and derive download links
    ///
    /// Safe to call repeatedly for the same session: only the first paid
    /// verification writes an order.
    pub async fn verify_session(&self, session_id: &str) -> Result<Verification> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(PaymentError::Validation("Missing session id".into()));
        }

        let session = self.provider.retrieve_session(session_id).await?;

        if !session.payment_status.is_paid() {
            tracing::info!(
                session_id = %session.id,
                status = ?session.payment_status,
                "Payment not verified"
            );
            return Ok(Verification::NotPaid {
                status: session.payment_status,
            });
        }

        let order = Order {
            session_id: session.id.clone(),
            email: session.customer_email.clone(),
            amount_minor: session.amount_total,
            items: session.descriptions.clone(),
            catalog_ids: session.catalog_ids.clone(),
            created_at: Utc::now(),
        };

        let outcome = self.orders.record_order(&order).await?;
        match outcome {
            OrderOutcome::Created => tracing::info!(
                session_id = %order.session_id,
                email = ?order.email,
                amount = %order.amount(),
                items = order.items.len(),
                "Recorded order"
            ),
            OrderOutcome::AlreadyRecorded => tracing::debug!(
                session_id = %order.session_id,
                "Order already recorded"
            ),
        }

        let downloads = self.downloads_for(&session)?;

        Ok(Verification::Paid { outcome, downloads })
    }

    /// Resolve purchased items to catalog files
    ///
    /// Sessions carrying catalog ids resolve by id. Older sessions without
    /// them fall back to exact display-name matching. Items that resolve to
    /// nothing, or to an entry without a file, are omitted. Descriptors are
    /// named after the line item the customer paid for.
    fn downloads_for(&self, session: &SessionSnapshot) -> Result<Vec<DownloadDescriptor>> {
        let entries: Vec<(&str, &CatalogEntry)> = if session.catalog_ids.is_empty() {
            session
                .descriptions
                .iter()
                .filter_map(|name| Some((name.as_str(), self.catalog.entry_by_name(name)?)))
                .collect()
        } else {
            // Ids are written in line-item order; descriptions only pair up when the counts agree.
            let paired = session.descriptions.len() == session.catalog_ids.len();
            session
                .catalog_ids
                .iter()
                .enumerate()
                .filter_map(|(i, id)| {
                    let entry = self.catalog.entry(id)?;
                    let name = session
                        .descriptions
                        .get(i)
                        .filter(|_| paired)
                        .map_or(entry.name.as_str(), String::as_str);
                    Some((name, entry))
                })
                .collect()
        };

        let now = Utc::now();
        let mut downloads = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            let Some(file) = entry.file.as_deref() else {
                continue;
            };
            downloads.push(DownloadDescriptor {
                name: name.to_string(),
                download_url: self.links.url_for(file, now)?,
            });
        }

        Ok(downloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockPaymentProvider;
    use storefront_core::MemoryStore;

    struct Fixture {
        service: CheckoutService,
        provider: Arc<MockPaymentProvider>,
        store: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let provider = Arc::new(MockPaymentProvider::new());
        let store = Arc::new(MemoryStore::new());
        let service = CheckoutService::new(
            Arc::new(Catalog::builtin().unwrap()),
            provider.clone(),
            store.clone(),
            DownloadLinks::new("http://localhost:3000").unwrap(),
            RedirectUrls::for_frontend("http://localhost:5173/"),
        );
        Fixture { service, provider, store }
    }

    #[test]
    fn test_redirect_urls() {
        let redirects = RedirectUrls::for_frontend("https://shop.example.com/");
        assert_eq!(
            redirects.success_url,
            "https://shop.example.com/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(redirects.cancel_url, "https://shop.example.com/cart");
    }

    #[tokio::test]
    async fn test_empty_cart_never_contacts_provider() {
        let f = fixture();

        let err = f.service.start_checkout(&Cart::default()).await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));

        let err = f
            .service
            .start_checkout(&Cart::products(["ebook-unknown"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));

        assert_eq!(f.provider.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_checkout_dedups_cart() {
        let f = fixture();
        let cart = Cart::products(["ebook-sdr", "ebook-sdr", "ebook-bdm"]).with_email("buyer@example.com");

        let session = f.service.start_checkout(&cart).await.unwrap();
        let snapshot = f.provider.retrieve_session(&session.id).await.unwrap();

        assert_eq!(snapshot.catalog_ids, ["ebook-sdr", "ebook-bdm"]);
        assert_eq!(snapshot.amount_total, 13800);
        assert_eq!(snapshot.customer_email.as_deref(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let f = fixture();
        f.provider.set_unavailable(true);

        let err = f
            .service
            .start_checkout(&Cart::bundle("sales-series"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Stripe(_)));
    }

    #[tokio::test]
    async fn test_unpaid_session_persists_nothing() {
        let f = fixture();
        let session = f.service.start_checkout(&Cart::bundle("sales-series")).await.unwrap();

        let verification = f.service.verify_session(&session.id).await.unwrap();
        assert!(matches!(
            verification,
            Verification::NotPaid { status: PaymentStatus::Unpaid }
        ));
        assert_eq!(f.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_repeat_verification_records_one_order() {
        let f = fixture();
        let session = f
            .service
            .start_checkout(&Cart::products(["ebook-sdr", "ebook-bdm"]))
            .await
            .unwrap();
        f.provider.mark_paid(&session.id, Some("buyer@example.com")).await;

        let first = f.service.verify_session(&session.id).await.unwrap();
        let second = f.service.verify_session(&session.id).await.unwrap();

        assert!(matches!(first, Verification::Paid { outcome: OrderOutcome::Created, .. }));
        assert!(matches!(second, Verification::Paid { outcome: OrderOutcome::AlreadyRecorded, .. }));
        assert_eq!(f.store.order_count().await, 1);

        let order = f.store.find_order(&session.id).await.unwrap().unwrap();
        assert_eq!(order.email.as_deref(), Some("buyer@example.com"));
        assert_eq!(order.items, ["SDR Success Playbook", "Business Development Playbook"]);
        assert_eq!(order.amount_minor, 13800);
    }

    #[tokio::test]
    async fn test_concurrent_verification_records_one_order() {
        let f = fixture();
        let session = f.service.start_checkout(&Cart::bundle("complete-bundle")).await.unwrap();
        f.provider.mark_paid(&session.id, None).await;

        let service = Arc::new(f.service);
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let id = session.id.clone();
                tokio::spawn(async move { service.verify_session(&id).await.unwrap() })
            })
            .collect();

        for task in tasks {
            assert!(matches!(task.await.unwrap(), Verification::Paid { .. }));
        }
        assert_eq!(f.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_downloads_by_name_for_legacy_sessions() {
        let f = fixture();
        f.provider
            .insert_session(SessionSnapshot {
                id: "cs_test_legacy".into(),
                payment_status: PaymentStatus::Paid,
                customer_email: Some("buyer@example.com".into()),
                amount_total: 13800,
                descriptions: vec![
                    "SDR Success Playbook".into(),
                    "Business Development Playbook".into(),
                    "Discontinued Title".into(),
                ],
                catalog_ids: vec![],
            })
            .await;

        let Verification::Paid { downloads, .. } = f.service.verify_session("cs_test_legacy").await.unwrap() else {
            panic!("expected paid session");
        };

        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[0].name, "SDR Success Playbook");
        assert!(downloads[0].download_url.ends_with("sdr-success-playbook.pdf"));
        assert!(downloads[1].download_url.ends_with("bdm-playbook.pdf"));
    }

    #[tokio::test]
    async fn test_downloads_by_catalog_id() {
        let f = fixture();
        let session = f.service.start_checkout(&Cart::bundle("sales-series")).await.unwrap();
        f.provider.mark_paid(&session.id, None).await;

        let Verification::Paid { downloads, .. } = f.service.verify_session(&session.id).await.unwrap() else {
            panic!("expected paid session");
        };

        assert_eq!(
            downloads,
            [DownloadDescriptor {
                name: "Sales Excellence Series (3 Books)".into(),
                download_url: "http://localhost:3000/download/sales-excellence-series.zip".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_downloads_keep_paid_line_item_name() {
        let f = fixture();
        f.provider
            .insert_session(SessionSnapshot {
                id: "cs_test_renamed".into(),
                payment_status: PaymentStatus::Paid,
                customer_email: None,
                amount_total: 6900,
                descriptions: vec!["SDR Playbook (First Edition)".into()],
                catalog_ids: vec!["ebook-sdr".into()],
            })
            .await;

        let Verification::Paid { downloads, .. } = f.service.verify_session("cs_test_renamed").await.unwrap() else {
            panic!("expected paid session");
        };

        assert_eq!(
            downloads,
            [DownloadDescriptor {
                name: "SDR Playbook (First Edition)".into(),
                download_url: "http://localhost:3000/download/sdr-success-playbook.pdf".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_product_id_never_resolves_to_bundle_file() {
        let definition: storefront_core::CatalogDefinition = serde_json::from_str(
            r#"{
                "products": { "guide": { "name": "Guide", "price": "5", "file": "guide.pdf" } },
                "bundles": { "guide": { "name": "Everything", "price": "100", "items": ["guide"], "file": "everything.zip" } }
            }"#,
        )
        .unwrap();
        assert!(Catalog::new(definition).is_err());

        let definition: storefront_core::CatalogDefinition = serde_json::from_str(
            r#"{
                "products": { "guide": { "name": "Guide", "price": "5", "file": "guide.pdf" } },
                "bundles": { "everything": { "name": "Everything", "price": "100", "items": ["guide"], "file": "everything.zip" } }
            }"#,
        )
        .unwrap();
        let provider = Arc::new(MockPaymentProvider::new());
        let service = CheckoutService::new(
            Arc::new(Catalog::new(definition).unwrap()),
            provider.clone(),
            Arc::new(MemoryStore::new()),
            DownloadLinks::new("http://localhost:3000").unwrap(),
            RedirectUrls::for_frontend("http://localhost:5173"),
        );

        let session = service.start_checkout(&Cart::products(["guide"])).await.unwrap();
        provider.mark_paid(&session.id, None).await;

        let Verification::Paid { downloads, .. } = service.verify_session(&session.id).await.unwrap() else {
            panic!("expected paid session");
        };
        assert_eq!(downloads.len(), 1);
        assert!(downloads[0].download_url.ends_with("/download/guide.pdf"));
    }

    #[tokio::test]
    async fn test_blank_session_id_rejected() {
        let f = fixture();
        let err = f.service.verify_session("  ").await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
        assert_eq!(f.provider.retrieve_calls(), 0);
    }
}
